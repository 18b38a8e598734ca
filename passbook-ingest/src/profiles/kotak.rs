//! Kotak Mahindra Bank statement profile
//!
//! Column positions move between statement versions, so they are read from
//! the header row on every page:
//!   # | TRANSACTION DATE | VALUE DATE | TRANSACTION DETAILS | | CHQ / REF NO. | DEBIT/CREDIT(₹) | BALANCE(₹)
//!   1 | 01 Jun 2025 | 01 Jun 2025 | UPI/SHIVAM | CLINIC/4123 | UPI-5151 | -500.00 | 5,44,651.07
//!     | 11:20 AM    |             | /PAYMENT   |             |          |         |
//!
//! The time of day wraps onto the next row and is joined onto the date.

use passbook_core::{ColumnRoleMap, RawAmount, RawTransaction, Role, TxnType};
use regex::Regex;
use std::sync::OnceLock;

use super::{AmountLayout, BankId, BankProfile, JoinPolicy, contains_marker};

const ROLES: &[Role] = &[
    Role::Date,
    Role::ValueDate,
    Role::Narration,
    Role::Reference,
    Role::SignedAmount,
    Role::Balance,
];

const FOOTER_MARKERS: &[&str] = &["STATEMENT GENERATED ON", "END OF STATEMENT"];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2}\s+[A-Z][a-z]{2}\s+\d{4}").expect("kotak date regex"))
}

/// Map header labels to roles. Checked in order, first match per cell wins.
fn label_role(label: &str) -> Option<Role> {
    let label = label.to_uppercase();
    if label.contains("TRANSACTION DATE") {
        Some(Role::Date)
    } else if label.contains("VALUE") {
        Some(Role::ValueDate)
    } else if label.contains("DETAILS") {
        Some(Role::Narration)
    } else if label.contains("CHQ / REF NO.") {
        Some(Role::Reference)
    } else if label.contains("DEBIT/CREDIT") {
        Some(Role::SignedAmount)
    } else if label.contains("BALANCE") {
        Some(Role::Balance)
    } else {
        None
    }
}

pub struct KotakProfile;

impl BankProfile for KotakProfile {
    fn bank(&self) -> BankId {
        BankId::Kotak
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
                    .filter(|(_, label)| label.as_str() != "#")
                    .filter_map(|(idx, label)| label_role(label).map(|role| (role, idx))),
            ),
            None => ColumnRoleMap::fallback(ROLES),
        }
    }

    fn is_header(&self, row: &[String]) -> bool {
        row.first().map(String::as_str) == Some("#")
            || row.iter().any(|c| c.to_uppercase() == "TRANSACTION DATE")
    }

    fn is_transaction_start(&self, row: &[String], roles: &ColumnRoleMap) -> bool {
        date_re().is_match(roles.cell(row, Role::Date))
    }

    fn is_noise_row(&self, row: &[String]) -> bool {
        contains_marker(row, FOOTER_MARKERS)
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

    /// Details often spill into the unlabeled cell to their right.
    fn role_text(&self, row: &[String], role: Role, roles: &ColumnRoleMap) -> String {
        match (role, roles.get(Role::Narration)) {
            (Role::Narration, Some(details)) => {
                let mut text = roles.cell(row, Role::Narration).to_string();
                if roles.get(Role::Reference) != Some(details + 1) {
                    text.push_str(row.get(details + 1).map(String::as_str).unwrap_or(""));
                }
                text
            }
            _ => roles.cell(row, role).to_string(),
        }
    }

    fn classify(&self, txn: &RawTransaction) -> (String, TxnType) {
        let raw = match &txn.amount {
            RawAmount::Signed(s) => s.as_str(),
            RawAmount::Split { .. } => "",
        };
        let check = passbook_core::text::strip_thousands(raw);
        let txn_type = if check.contains('-') {
            TxnType::Debit
        } else if check.contains('+') {
            TxnType::Credit
        } else {
            match check.parse::<f64>() {
                Ok(v) if v < 0.0 => TxnType::Debit,
                Ok(_) => TxnType::Credit,
                Err(_) => TxnType::Unknown,
            }
        };
        (check.replace(['-', '+'], ""), txn_type)
    }
}
