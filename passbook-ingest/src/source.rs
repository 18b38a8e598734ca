//! Table extraction boundary.
//!
//! PDF decoding and table geometry live outside this crate. The engine only
//! sees [`RawTable`]s handed over page by page through [`TableSource`].
//!
//! Bundled sources:
//! - [`JsonTableDocument`]: tables already extracted to JSON
//!   `{"password": "...", "pages": [[table, ...], ...]}` where a table is a
//!   list of rows of nullable cells.
//! - [`MemoryDocument`]: in-process pages, for tests and embedding.

use passbook_core::{DocumentOpenError, PageError, RawRow, RawTable};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An open document. Dropping it releases the underlying handle.
pub trait TableSource: Send {
    fn page_count(&self) -> usize;

    /// Rows of every table on `page` (1-based), in extraction order.
    fn extract_page(&mut self, page: usize) -> Result<RawTable, PageError>;
}

/// Something that can be opened into a [`TableSource`].
pub trait DocumentOpener: Send + Sync {
    fn open(&self, password: Option<&str>) -> Result<Box<dyn TableSource>, DocumentOpenError>;
}

fn check_password(expected: Option<&str>, given: Option<&str>) -> Result<(), DocumentOpenError> {
    match (expected, given) {
        (None, _) => Ok(()),
        (Some(_), None) => Err(DocumentOpenError::PasswordRequired),
        (Some(e), Some(g)) if e == g => Ok(()),
        (Some(_), Some(_)) => Err(DocumentOpenError::WrongPassword),
    }
}

fn check_range(page: usize, page_count: usize) -> Result<(), PageError> {
    if page == 0 || page > page_count {
        return Err(PageError::OutOfRange { page, page_count });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct JsonDocumentFile {
    #[serde(default)]
    password: Option<String>,
    pages: Vec<Value>,
}

/// Pre-extracted tables stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonTableDocument {
    path: PathBuf,
}

impl JsonTableDocument {
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentOpener for JsonTableDocument {
    fn open(&self, password: Option<&str>) -> Result<Box<dyn TableSource>, DocumentOpenError> {
        let bytes = std::fs::read(&self.path)?;
        let file: JsonDocumentFile = serde_json::from_slice(&bytes)
            .map_err(|e| DocumentOpenError::Unreadable(format!("{}: {e}", self.path.display())))?;
        check_password(file.password.as_deref(), password)?;

        log::info!("opened {} ({} pages)", self.path.display(), file.pages.len());
        Ok(Box::new(JsonTableSource { pages: file.pages }))
    }
}

/// Pages are kept as raw JSON and decoded one at a time, so a broken page
/// only fails itself.
struct JsonTableSource {
    pages: Vec<Value>,
}

impl TableSource for JsonTableSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_page(&mut self, page: usize) -> Result<RawTable, PageError> {
        check_range(page, self.pages.len())?;
        let tables: Vec<Vec<RawRow>> = serde_json::from_value(self.pages[page - 1].clone())
            .map_err(|e| PageError::Extraction {
                page,
                reason: e.to_string(),
            })?;
        Ok(RawTable::new(tables.into_iter().flatten().collect()))
    }
}

/// In-memory document. Pages can be marked as failing to exercise isolation.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    password: Option<String>,
    pages: Vec<RawTable>,
    failures: BTreeMap<usize, String>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<RawTable>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Make extraction of `page` (1-based) fail with `reason`.
    pub fn fail_page(mut self, page: usize, reason: impl Into<String>) -> Self {
        self.failures.insert(page, reason.into());
        self
    }
}

impl DocumentOpener for MemoryDocument {
    fn open(&self, password: Option<&str>) -> Result<Box<dyn TableSource>, DocumentOpenError> {
        check_password(self.password.as_deref(), password)?;
        Ok(Box::new(self.clone()))
    }
}

impl TableSource for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_page(&mut self, page: usize) -> Result<RawTable, PageError> {
        check_range(page, self.pages.len())?;
        if let Some(reason) = self.failures.get(&page) {
            return Err(PageError::Extraction {
                page,
                reason: reason.clone(),
            });
        }
        Ok(self.pages[page - 1].clone())
    }
}
