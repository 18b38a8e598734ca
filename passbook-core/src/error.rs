//! Failure taxonomy.
//!
//! Malformed rows are not represented here: they are dropped silently and only
//! show up in grouping statistics.

use thiserror::Error;

/// The document could not be opened at all. Fatal for the whole document.
#[derive(Debug, Error)]
pub enum DocumentOpenError {
    #[error("document is password protected")]
    PasswordRequired,
    #[error("incorrect password")]
    WrongPassword,
    #[error("unreadable document: {0}")]
    Unreadable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One page failed. Recovered locally; sibling pages are unaffected.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page {page} out of range (document has {page_count} pages)")]
    OutOfRange { page: usize, page_count: usize },
    #[error("table extraction failed on page {page}: {reason}")]
    Extraction { page: usize, reason: String },
    #[error("grouping failed on page {page}: {reason}")]
    Grouping { page: usize, reason: String },
}
