//! Bank profiles: the per-bank rules the grouping engine is driven by.
//!
//! Each bank is one variant of [`BankId`] and one [`BankProfile`] impl in its
//! own module. The engine never branches on the bank; it only calls the trait.

pub mod hdfc;
pub mod icici;
pub mod karnavati;
pub mod kotak;
pub mod union;

use passbook_core::text::compact_upper;
use passbook_core::{ColumnRoleMap, RawAmount, RawTransaction, Role, TxnType};
use serde::{Deserialize, Serialize};

/// Supported banks. Unrecognized names resolve to [`BankId::Kotak`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankId {
    Hdfc,
    Icici,
    Karnavati,
    Kotak,
    Union,
}

impl BankId {
    pub const ALL: [BankId; 5] = [
        BankId::Hdfc,
        BankId::Icici,
        BankId::Karnavati,
        BankId::Kotak,
        BankId::Union,
    ];

    /// Resolve a bank selector. Never fails; unknown names fall back to Kotak.
    pub fn resolve(name: &str) -> BankId {
        let key = name.trim().to_uppercase();
        match key.as_str() {
            "HDFC BANK" | "HDFC" => BankId::Hdfc,
            "ICICI BANK" | "ICICI" => BankId::Icici,
            "KARNAVATI BANK" | "KARNAVATI" => BankId::Karnavati,
            "UNION BANK OF INDIA" | "UNION" => BankId::Union,
            "KOTAK MAHINDRA BANK" | "KOTAK" => BankId::Kotak,
            _ => {
                log::debug!("unrecognized bank {:?}, using {}", name, BankId::Kotak.name());
                BankId::Kotak
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BankId::Hdfc => "HDFC BANK",
            BankId::Icici => "ICICI BANK",
            BankId::Karnavati => "KARNAVATI BANK",
            BankId::Kotak => "KOTAK MAHINDRA BANK",
            BankId::Union => "UNION BANK OF INDIA",
        }
    }

    pub fn profile(&self) -> &'static dyn BankProfile {
        match self {
            BankId::Hdfc => &hdfc::HdfcProfile,
            BankId::Icici => &icici::IciciProfile,
            BankId::Karnavati => &karnavati::KarnavatiProfile,
            BankId::Kotak => &kotak::KotakProfile,
            BankId::Union => &union::UnionProfile,
        }
    }
}

/// How values from successive rows of one group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    Space,
    Concat,
    /// Only the start row's value counts; continuation rows are ignored.
    StartRow,
}

impl JoinPolicy {
    pub fn join(&self, parts: &[String]) -> String {
        match self {
            JoinPolicy::Space => parts.join(" "),
            JoinPolicy::Concat | JoinPolicy::StartRow => parts.concat(),
        }
    }
}

/// Which amount columns a bank uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountLayout {
    Signed,
    Split,
}

pub trait BankProfile: Send + Sync {
    fn bank(&self) -> BankId;

    /// Rows with fewer cells are malformed and dropped.
    fn min_columns(&self) -> usize;

    /// Column mapping for one page. `rows` are already normalized.
    fn role_map(&self, rows: &[Vec<String>]) -> ColumnRoleMap;

    fn is_header(&self, row: &[String]) -> bool;

    fn is_transaction_start(&self, row: &[String], roles: &ColumnRoleMap) -> bool;

    /// Only consulted for continuation rows.
    fn is_noise_row(&self, _row: &[String]) -> bool {
        false
    }

    fn amount_layout(&self) -> AmountLayout;

    fn join_policy(&self, role: Role) -> JoinPolicy;

    /// Bank-specific cell repairs, applied after whitespace normalization.
    fn repair_row(&self, _row: &mut [String]) {}

    /// Text a single row contributes to `role`.
    fn role_text(&self, row: &[String], role: Role, roles: &ColumnRoleMap) -> String {
        roles.cell(row, role).to_string()
    }

    /// Fold one row's value for `role` into the values gathered so far.
    fn merge_continuation(&self, _role: Role, mut acc: Vec<String>, value: String) -> Vec<String> {
        if !value.is_empty() {
            acc.push(value);
        }
        acc
    }

    /// Direction and magnitude of a merged transaction.
    fn classify(&self, txn: &RawTransaction) -> (String, TxnType);

    fn txn_id(&self, txn: &RawTransaction, _amount: &str) -> String {
        txn.reference.clone()
    }

    fn clean_balance(&self, balance: &str) -> String {
        passbook_core::text::strip_thousands(balance)
    }
}

/// True when the row's uppercased text contains any marker, ignoring whitespace.
pub(crate) fn contains_marker(row: &[String], markers: &[&str]) -> bool {
    let text = compact_upper(&row.join(" "));
    markers.iter().any(|m| text.contains(&compact_upper(m)))
}

/// `-`/`+` prefixed amount → magnitude and direction.
pub(crate) fn classify_sign_prefix(amount: &str) -> (String, TxnType) {
    let amount = passbook_core::text::strip_thousands(amount);
    if amount.starts_with('-') {
        (amount.replace('-', ""), TxnType::Debit)
    } else if amount.starts_with('+') {
        (amount.replace('+', ""), TxnType::Credit)
    } else {
        (amount, TxnType::Unknown)
    }
}

/// Debit/credit column pair → magnitude and direction. `absent` values
/// (besides blanks) count as no amount.
pub(crate) fn classify_split(amount: &RawAmount, absent: &[&str]) -> (String, TxnType) {
    let present = |s: &str| !s.is_empty() && !absent.iter().any(|a| s.eq_ignore_ascii_case(a));
    match amount {
        RawAmount::Split { debit, credit } => {
            let debit = passbook_core::text::strip_thousands(debit);
            let credit = passbook_core::text::strip_thousands(credit);
            if present(&debit) {
                (debit, TxnType::Debit)
            } else if present(&credit) {
                (credit, TxnType::Credit)
            } else {
                ("0.00".to_string(), TxnType::Unknown)
            }
        }
        RawAmount::Signed(s) => classify_sign_prefix(s),
    }
}
