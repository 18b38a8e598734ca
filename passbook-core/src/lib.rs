//! passbook-core: data model shared by the statement reconstruction engine

pub mod error;
pub mod roles;
pub mod text;
pub mod types;

pub use error::{DocumentOpenError, PageError};
pub use roles::{ColumnRoleMap, Role, RoleSource};
pub use types::{
    DocumentMeta, PageRecord, RawAmount, RawCell, RawRow, RawTable, RawTransaction, StreamRecord,
    StructuredTransaction, TransactionGroup, TxnType,
};
