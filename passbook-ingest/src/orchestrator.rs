//! Document-level driver.
//!
//! Opening → (extract → group → structure → emit per page)* → Closed, or
//! Failed when the document cannot be opened. A failed open yields a single
//! page-0 error record. A failed page yields an error-tagged record with no
//! transactions and processing moves on to the next page.

use chrono::Utc;
use passbook_core::{
    DocumentMeta, PageError, PageRecord, StreamRecord, StructuredTransaction,
};
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::grouping::process_page;
use crate::profiles::BankId;
use crate::source::{DocumentOpener, TableSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Opening,
    Processing,
    Closed,
    Failed,
}

/// Batch result for a whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub bank: String,
    pub page_count: usize,
    pub pages: Vec<PageRecord>,
}

impl DocumentReport {
    /// All transactions, page order then row order.
    pub fn transactions(&self) -> impl Iterator<Item = &StructuredTransaction> {
        self.pages.iter().flat_map(|p| p.transactions.iter())
    }

    pub fn into_transactions(self) -> Vec<StructuredTransaction> {
        self.pages.into_iter().flat_map(|p| p.transactions).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter().filter(|p| p.is_error())
    }

    /// `success`, `partial` (some pages failed) or `failed` (document did not open).
    pub fn status(&self) -> &'static str {
        if self.pages.iter().any(|p| p.page == 0 && p.is_error()) {
            "failed"
        } else if self.errors().next().is_some() {
            "partial"
        } else {
            "success"
        }
    }
}

fn open_failure_record(err: &dyn std::fmt::Display) -> PageRecord {
    PageRecord::failed(0, format!("Failed to open document: {err}"))
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic while processing page".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    bank: BankId,
}

impl Orchestrator {
    /// Unknown bank names fall back to the default profile.
    pub fn new(bank_name: &str) -> Self {
        Self::for_bank(BankId::resolve(bank_name))
    }

    pub fn for_bank(bank: BankId) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> BankId {
        self.bank
    }

    /// Extract, group and structure one page. Never fails: errors and panics
    /// become an error-tagged record.
    pub fn process_page(&self, source: &mut dyn TableSource, page: usize) -> PageRecord {
        let profile = self.bank.profile();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let table = source.extract_page(page)?;
            Ok::<_, PageError>(process_page(profile, &table))
        }))
        .unwrap_or_else(|payload| {
            Err(PageError::Grouping {
                page,
                reason: panic_reason(payload.as_ref()),
            })
        });

        match outcome {
            Ok(transactions) => {
                log::info!("page {page}: {} transactions", transactions.len());
                PageRecord::ok(page, transactions)
            }
            Err(e) => {
                log::warn!("page {page} failed: {e}");
                PageRecord::failed(page, e.to_string())
            }
        }
    }

    /// Process every page in order and collect the results.
    pub fn run_batch(&self, doc: &dyn DocumentOpener, password: Option<&str>) -> DocumentReport {
        let mut stream = self.stream(doc, password);
        let mut report = DocumentReport {
            bank: self.bank.name().to_string(),
            page_count: stream.page_count(),
            pages: Vec::new(),
        };
        for record in stream.by_ref() {
            if let StreamRecord::Page(page) = record {
                report.pages.push(page);
            }
        }
        report
    }

    /// Like [`run_batch`](Self::run_batch) but spreads pages over `workers`
    /// threads. Each worker opens its own handle; pages share no state.
    pub fn run_batch_parallel(
        &self,
        doc: &dyn DocumentOpener,
        password: Option<&str>,
        workers: usize,
    ) -> DocumentReport {
        let bank = self.bank.name().to_string();
        let page_count = match doc.open(password) {
            Ok(source) => source.page_count(),
            Err(e) => {
                log::warn!("failed to open document: {e}");
                return DocumentReport {
                    bank,
                    page_count: 0,
                    pages: vec![open_failure_record(&e)],
                };
            }
        };
        let workers = workers.clamp(1, page_count.max(1));

        let mut pages: Vec<PageRecord> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let assigned: Vec<usize> = (1..=page_count).skip(w).step_by(workers).collect();
                    let pages = assigned.clone();
                    let handle = scope.spawn(move || match doc.open(password) {
                        Ok(mut source) => pages
                            .iter()
                            .map(|&p| self.process_page(&mut *source, p))
                            .collect::<Vec<_>>(),
                        Err(e) => pages.iter().map(|&p| PageRecord::failed(p, e.to_string())).collect(),
                    });
                    (assigned, handle)
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|(assigned, handle)| {
                    handle.join().unwrap_or_else(|payload| {
                        let reason = panic_reason(payload.as_ref());
                        log::warn!("worker for pages {assigned:?} panicked: {reason}");
                        assigned
                            .into_iter()
                            .map(|p| PageRecord::failed(p, reason.clone()))
                            .collect()
                    })
                })
                .collect()
        });
        pages.sort_by_key(|p| p.page);

        DocumentReport {
            bank,
            page_count,
            pages,
        }
    }

    /// Page-by-page iterator: a metadata record, then one record per page.
    /// The document handle is dropped when the iterator finishes or is dropped.
    pub fn stream(&self, doc: &dyn DocumentOpener, password: Option<&str>) -> DocumentStream {
        DocumentStream::open(*self, doc, password)
    }
}

/// Incremental document processing. See [`Orchestrator::stream`].
pub struct DocumentStream {
    orchestrator: Orchestrator,
    source: Option<Box<dyn TableSource>>,
    page_count: usize,
    next_page: usize,
    pending: VecDeque<StreamRecord>,
    state: DocumentState,
}

impl DocumentStream {
    fn open(orchestrator: Orchestrator, doc: &dyn DocumentOpener, password: Option<&str>) -> Self {
        let mut stream = Self {
            orchestrator,
            source: None,
            page_count: 0,
            next_page: 1,
            pending: VecDeque::new(),
            state: DocumentState::Opening,
        };

        match doc.open(password) {
            Ok(source) => {
                stream.page_count = source.page_count();
                stream.source = Some(source);
                stream.state = DocumentState::Processing;
                stream.pending.push_back(StreamRecord::Meta(DocumentMeta {
                    bank: orchestrator.bank.name().to_string(),
                    page_count: stream.page_count,
                    started_at: Utc::now(),
                }));
            }
            Err(e) => {
                log::warn!("failed to open document: {e}");
                stream.state = DocumentState::Failed;
                stream.pending.push_back(StreamRecord::Page(open_failure_record(&e)));
            }
        }
        stream
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

impl Iterator for DocumentStream {
    type Item = StreamRecord;

    fn next(&mut self) -> Option<StreamRecord> {
        if let Some(record) = self.pending.pop_front() {
            return Some(record);
        }

        let source = self.source.as_mut()?;
        if self.next_page > self.page_count {
            self.source = None;
            self.state = DocumentState::Closed;
            return None;
        }

        let page = self.next_page;
        self.next_page += 1;
        log::info!("processing page {page}/{}", self.page_count);
        Some(StreamRecord::Page(
            self.orchestrator.process_page(&mut **source, page),
        ))
    }
}

/// Async wrapper over [`DocumentStream`] for streaming responses.
///
/// Pages are processed on a blocking thread and handed over through a bounded
/// channel. Dropping the returned stream stops processing after the page in
/// flight and releases the document. Must be called inside a tokio runtime.
pub fn stream_async(
    orchestrator: Orchestrator,
    doc: Arc<dyn DocumentOpener>,
    password: Option<String>,
    buffer: usize,
) -> impl futures_util::Stream<Item = StreamRecord> + Send + 'static {
    let (tx, rx) = tokio::sync::mpsc::channel(buffer.max(1));

    tokio::task::spawn_blocking(move || {
        for record in orchestrator.stream(doc.as_ref(), password.as_deref()) {
            if tx.blocking_send(record).is_err() {
                log::info!("stream consumer dropped; closing document");
                break;
            }
        }
    });

    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|record| (record, rx))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryDocument;
    use passbook_core::{RawTable, TxnType};

    fn union_page(rows: &[[&str; 6]]) -> RawTable {
        let mut all = vec![["Date", "Time", "Transaction Id", "Remarks", "Amount(Rs.)", "Balance(Rs.)"]];
        all.extend_from_slice(rows);
        RawTable::from_text_rows(all)
    }

    fn two_page_doc() -> MemoryDocument {
        MemoryDocument::new(vec![
            union_page(&[
                ["01-12-2025", "", "A1", "FIRST", "10.0(Dr)", "90.0(Cr)"],
                ["02-12-2025", "", "A2", "SECOND", "5.0(Cr)", "95.0(Cr)"],
            ]),
            union_page(&[["03-12-2025", "", "B1", "THIRD", "1.0(Dr)", "94.0(Cr)"]]),
        ])
    }

    #[test]
    fn test_batch_preserves_page_then_row_order() {
        let report = Orchestrator::new("UNION BANK OF INDIA").run_batch(&two_page_doc(), None);
        assert_eq!(report.status(), "success");
        assert_eq!(report.page_count, 2);
        let ids: Vec<&str> = report.transactions().map(|t| t.txn_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "B1"]);
        assert_eq!(report.pages[1].transactions[0].txn_type, TxnType::Debit);
    }

    #[test]
    fn test_stream_emits_meta_then_pages() {
        let orch = Orchestrator::for_bank(BankId::Union);
        let mut stream = orch.stream(&two_page_doc(), None);
        assert_eq!(stream.state(), DocumentState::Processing);

        let records: Vec<StreamRecord> = stream.by_ref().collect();
        assert_eq!(records.len(), 3);
        assert!(matches!(&records[0], StreamRecord::Meta(m) if m.page_count == 2 && m.bank == "UNION BANK OF INDIA"));
        assert!(matches!(&records[1], StreamRecord::Page(p) if p.page == 1 && p.transactions.len() == 2));
        assert!(matches!(&records[2], StreamRecord::Page(p) if p.page == 2));
        assert_eq!(stream.state(), DocumentState::Closed);
    }

    #[test]
    fn test_failed_page_is_isolated() {
        let doc = two_page_doc().fail_page(1, "table finder crashed");
        let report = Orchestrator::for_bank(BankId::Union).run_batch(&doc, None);
        assert_eq!(report.status(), "partial");
        assert_eq!(report.pages.len(), 2);
        assert!(report.pages[0].error.as_deref().unwrap().contains("table finder crashed"));
        assert!(report.pages[0].transactions.is_empty());
        assert_eq!(report.pages[1].transactions.len(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let doc = two_page_doc();
        let orch = Orchestrator::for_bank(BankId::Union);
        assert_eq!(orch.run_batch_parallel(&doc, None, 4), orch.run_batch(&doc, None));
    }

    #[test]
    fn test_panic_during_extraction_becomes_page_error() {
        struct Exploding;
        impl TableSource for Exploding {
            fn page_count(&self) -> usize {
                1
            }
            fn extract_page(&mut self, _page: usize) -> Result<RawTable, PageError> {
                panic!("boom")
            }
        }

        let record = Orchestrator::for_bank(BankId::Kotak).process_page(&mut Exploding, 1);
        assert_eq!(record.page, 1);
        assert!(record.error.as_deref().unwrap().contains("boom"));
        assert!(record.transactions.is_empty());
    }

    #[test]
    fn test_parallel_worker_panic_fails_its_pages() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        /// Opens fine once, then panics for every worker handle.
        struct FlakyOpener {
            inner: MemoryDocument,
            opens: AtomicUsize,
        }
        impl DocumentOpener for FlakyOpener {
            fn open(
                &self,
                password: Option<&str>,
            ) -> Result<Box<dyn TableSource>, passbook_core::DocumentOpenError> {
                if self.opens.fetch_add(1, Ordering::SeqCst) > 0 {
                    panic!("handle pool exhausted");
                }
                self.inner.open(password)
            }
        }

        let doc = FlakyOpener {
            inner: two_page_doc(),
            opens: AtomicUsize::new(0),
        };
        let report = Orchestrator::for_bank(BankId::Union).run_batch_parallel(&doc, None, 2);
        assert_eq!(report.page_count, 2);
        let pages: Vec<usize> = report.pages.iter().map(|p| p.page).collect();
        assert_eq!(pages, vec![1, 2]);
        assert!(report.pages.iter().all(|p| p.is_error() && p.transactions.is_empty()));
        assert!(report.pages[0].error.as_deref().unwrap().contains("handle pool exhausted"));
        assert_eq!(report.status(), "partial");
    }

    #[tokio::test]
    async fn test_stream_async_yields_all_records() {
        use futures_util::StreamExt;

        let doc: Arc<dyn DocumentOpener> = Arc::new(two_page_doc());
        let records: Vec<StreamRecord> =
            stream_async(Orchestrator::for_bank(BankId::Union), doc, None, 1)
                .collect()
                .await;
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], StreamRecord::Meta(_)));
    }
}
