//! passbook-ingest: bank profiles, the row grouping engine, and document orchestration.

pub mod grouping;
pub mod orchestrator;
pub mod profiles;
pub mod source;
pub mod structured;

pub use grouping::{GroupingStats, PageGrouping, group_rows, group_transactions, merge_group, process_page};
pub use orchestrator::{DocumentReport, DocumentState, DocumentStream, Orchestrator, stream_async};
pub use profiles::{AmountLayout, BankId, BankProfile, JoinPolicy};
pub use source::{DocumentOpener, JsonTableDocument, MemoryDocument, TableSource};
pub use structured::generate_structured_output;
