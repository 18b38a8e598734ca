//! Union Bank of India statement profile
//!
//! Columns are read from the header row, recognised by its last two labels:
//!   Date | Time | Transaction Id | Remarks | Amount(Rs.) | Balance(Rs.)
//!   16-12-2025 | | V53604535 | UPIAR/535043861014/DR/Maheshwa | 60.0(Dr) | 1309.13(Cr)
//!
//! Amount and balance carry a trailing `(Dr)`/`(Cr)` tag instead of a sign.

use passbook_core::text::strip_thousands;
use passbook_core::{ColumnRoleMap, RawAmount, RawTransaction, Role, TxnType};
use regex::Regex;
use std::sync::OnceLock;

use super::{AmountLayout, BankId, BankProfile, JoinPolicy, classify_sign_prefix};

const ROLES: &[Role] = &[
    Role::Date,
    Role::Reference,
    Role::Narration,
    Role::SignedAmount,
    Role::Balance,
];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}-\d{1,2}-\d{4}").expect("union date regex"))
}

fn label_role(label: &str) -> Option<Role> {
    let label = label.to_uppercase();
    if label.contains("DATE") {
        Some(Role::Date)
    } else if label.contains("SACTION ID") {
        Some(Role::Reference)
    } else if label.contains("REMARKS") {
        Some(Role::Narration)
    } else if label.contains("AMOUNT") {
        Some(Role::SignedAmount)
    } else if label.contains("BALANCE") {
        Some(Role::Balance)
    } else {
        None
    }
}

/// Concatenation of the cells from `from` up to (not including) `to`.
fn span_text(row: &[String], from: Option<usize>, to: Option<usize>) -> String {
    match (from, to) {
        (Some(from), Some(to)) if from < to => row
            .iter()
            .take(to)
            .skip(from)
            .map(String::as_str)
            .collect(),
        _ => String::new(),
    }
}

/// `60.0(Dr)` → `-60.0`, `1,200.00(Cr)` → `+1200.00`. Untagged text is returned as-is.
pub fn signed_from_tag(amount: &str) -> (String, TxnType) {
    let check = strip_thousands(amount);
    if check.contains("Dr") {
        (format!("-{}", check.replace("(Dr)", "")), TxnType::Debit)
    } else if check.contains("Cr") {
        (format!("+{}", check.replace("(Cr)", "")), TxnType::Credit)
    } else {
        (check, TxnType::Unknown)
    }
}

pub struct UnionProfile;

impl BankProfile for UnionProfile {
    fn bank(&self) -> BankId {
        BankId::Union
    }

    fn min_columns(&self) -> usize {
        2
    }

    fn role_map(&self, rows: &[Vec<String>]) -> ColumnRoleMap {
        match rows.iter().find(|r| self.is_header(r)) {
            Some(header) => ColumnRoleMap::from_header(
                ROLES,
                header
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, label)| label_role(label).map(|role| (role, idx))),
            ),
            None => ColumnRoleMap::fallback(ROLES),
        }
    }

    fn is_header(&self, row: &[String]) -> bool {
        let n = row.len();
        n >= 2
            && row[n - 1].to_uppercase().contains("BALANCE")
            && row[n - 2].to_uppercase().contains("AMOUNT")
    }

    fn is_transaction_start(&self, row: &[String], roles: &ColumnRoleMap) -> bool {
        date_re().is_match(roles.cell(row, Role::Date))
    }

    fn amount_layout(&self) -> AmountLayout {
        AmountLayout::Signed
    }

    fn join_policy(&self, role: Role) -> JoinPolicy {
        match role {
            Role::Date => JoinPolicy::Space,
            _ => JoinPolicy::Concat,
        }
    }

    fn role_text(&self, row: &[String], role: Role, roles: &ColumnRoleMap) -> String {
        match role {
            Role::Reference => span_text(row, roles.get(Role::Reference), roles.get(Role::Narration)),
            Role::Narration => span_text(row, roles.get(Role::Narration), roles.get(Role::SignedAmount)),
            _ => roles.cell(row, role).to_string(),
        }
    }

    fn classify(&self, txn: &RawTransaction) -> (String, TxnType) {
        let raw = match &txn.amount {
            RawAmount::Signed(s) => s.as_str(),
            RawAmount::Split { .. } => "",
        };
        match signed_from_tag(raw) {
            (signed, TxnType::Unknown) => (signed, TxnType::Unknown),
            (signed, _) => classify_sign_prefix(&signed),
        }
    }

    fn clean_balance(&self, balance: &str) -> String {
        strip_thousands(&balance.replace("(Cr)", "").replace("(Dr)", ""))
    }
}
