//! Raw table input, intermediate groups, and the canonical transaction output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single extracted cell. `None` when the extractor found no text at all.
pub type RawCell = Option<String>;

/// One extracted table row. Cell positions are significant.
pub type RawRow = Vec<RawCell>;

/// All rows extracted from one page, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    /// Build a table from plain text cells. Empty strings stay as `Some("")`.
    pub fn from_text_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|c| Some(c.into())).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Normalized rows belonging to a single transaction.
///
/// The first row is the start row (it carries the transaction date); the rest
/// are continuation rows holding wrapped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGroup {
    pub rows: Vec<Vec<String>>,
}

impl TransactionGroup {
    pub fn start(row: Vec<String>) -> Self {
        Self { rows: vec![row] }
    }

    pub fn push_continuation(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn start_row(&self) -> &[String] {
        &self.rows[0]
    }

    pub fn continuations(&self) -> &[Vec<String>] {
        &self.rows[1..]
    }
}

/// Amount columns as merged from a group, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawAmount {
    /// One column carrying a sign prefix or a `(Dr)`/`(Cr)` tag.
    Signed(String),
    /// Separate withdrawal and deposit columns.
    Split { debit: String, credit: String },
}

/// One merged transaction tuple produced by the grouping engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: String,
    pub value_date: String,
    pub narration: String,
    pub reference: String,
    pub amount: RawAmount,
    pub balance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxnType {
    Debit,
    Credit,
    Unknown,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Debit => "DEBIT",
            TxnType::Credit => "CREDIT",
            TxnType::Unknown => "UNKNOWN",
        }
    }
}

/// Canonical output record.
///
/// `amount` is always a magnitude; direction lives only in `txn_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredTransaction {
    pub date: String,
    #[serde(rename = "txnId")]
    pub txn_id: String,
    pub remarks: String,
    pub amount: String,
    pub balance: String,
    #[serde(rename = "type")]
    pub txn_type: TxnType,
}

/// Result for a single page. `page` is 1-based; page 0 is reserved for
/// document-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: usize,
    pub transactions: Vec<StructuredTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    pub fn ok(page: usize, transactions: Vec<StructuredTransaction>) -> Self {
        Self {
            page,
            transactions,
            error: None,
        }
    }

    pub fn failed(page: usize, error: impl Into<String>) -> Self {
        Self {
            page,
            transactions: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// First record of a streamed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub bank: String,
    pub page_count: usize,
    pub started_at: DateTime<Utc>,
}

/// One line of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamRecord {
    Meta(DocumentMeta),
    Page(PageRecord),
}
