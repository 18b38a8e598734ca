//! ICICI Bank statement profile
//!
//! Expected table layout (9 columns):
//!   S No. | Transaction ID | Value Date | Txn Posted Date | ChequeNo. | Description | Withdrawal | Deposit | Balance
//!   1 | S12345678 | 01-May-2024 | 01-May-2024 | NA | UPI/... | 250.00 | NA | 12,000.00
//!
//! The extractor sometimes splits dates as `01-May- 2024`; both date columns
//! are repaired before the start predicate runs.

use passbook_core::{ColumnRoleMap, RawTransaction, Role, TxnType};
use regex::Regex;
use std::sync::OnceLock;

use super::{AmountLayout, BankId, BankProfile, JoinPolicy, classify_split};

const TXN_ID_COL: usize = 1;
const VALUE_DATE_COL: usize = 2;
const TXN_DATE_COL: usize = 3;
const REMARKS_COL: usize = 5;
const WITHDRAW_COL: usize = 6;
const DEPOSIT_COL: usize = 7;
const BAL_COL: usize = 8;

/// Marks an empty amount column.
const ABSENT: &[&str] = &["NA"];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}-[A-Za-z]{3}-\d{4}$").expect("icici date regex"))
}

fn split_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z]{3})-\s+(\d{4})").expect("icici split year regex"))
}

/// `01-May- 2024` → `01-May-2024`
pub fn repair_date(val: &str) -> String {
    split_year_re().replace_all(val, "$1-$2").into_owned()
}

pub struct IciciProfile;

impl BankProfile for IciciProfile {
    fn bank(&self) -> BankId {
        BankId::Icici
    }

    fn min_columns(&self) -> usize {
        9
    }

    fn role_map(&self, _rows: &[Vec<String>]) -> ColumnRoleMap {
        ColumnRoleMap::fixed(&[
            (Role::Reference, TXN_ID_COL),
            (Role::ValueDate, VALUE_DATE_COL),
            (Role::Date, TXN_DATE_COL),
            (Role::Narration, REMARKS_COL),
            (Role::DebitAmount, WITHDRAW_COL),
            (Role::CreditAmount, DEPOSIT_COL),
            (Role::Balance, BAL_COL),
        ])
    }

    fn is_header(&self, row: &[String]) -> bool {
        let starts = |i: usize, prefix: &str| {
            row.get(i)
                .is_some_and(|c| c.to_lowercase().starts_with(prefix))
        };
        starts(0, "sr") || starts(1, "tran")
    }

    fn repair_row(&self, row: &mut [String]) {
        for col in [VALUE_DATE_COL, TXN_DATE_COL] {
            if let Some(cell) = row.get_mut(col) {
                *cell = repair_date(cell);
            }
        }
    }

    /// Validated on the value date, not the posting date.
    fn is_transaction_start(&self, row: &[String], roles: &ColumnRoleMap) -> bool {
        date_re().is_match(roles.cell(row, Role::ValueDate))
    }

    fn amount_layout(&self) -> AmountLayout {
        AmountLayout::Split
    }

    fn join_policy(&self, role: Role) -> JoinPolicy {
        match role {
            Role::Narration => JoinPolicy::Space,
            Role::Reference => JoinPolicy::Concat,
            _ => JoinPolicy::StartRow,
        }
    }

    fn classify(&self, txn: &RawTransaction) -> (String, TxnType) {
        classify_split(&txn.amount, ABSENT)
    }
}
