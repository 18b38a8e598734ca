//! Karnavati Bank statement profile
//!
//! Expected table layout (7 columns):
//!   TRN DATE | VALUE DATE | PARTICULARS | CHQ/REF | DEBIT | CREDIT | BALANCE
//!   05-06-2024 | 05-06-2024 | IMPS 415712345678 RAMESH | | 2,000.00 | | 8,450.25
//!
//! There is no reference column worth keeping; the transaction id is pulled
//! out of the narration instead.

use passbook_core::{ColumnRoleMap, RawTransaction, Role, TxnType};
use regex::Regex;
use std::sync::OnceLock;

use super::{AmountLayout, BankId, BankProfile, JoinPolicy, classify_split};

const TXN_DATE_COL: usize = 0;
const VALUE_DATE_COL: usize = 1;
const NARR_COL: usize = 2;
const REF_COL: usize = 3;
const DEBIT_COL: usize = 4;
const CREDIT_COL: usize = 5;
const BAL_COL: usize = 6;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("karnavati date regex"))
}

/// Tried in order; the first hit wins.
fn reference_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"IMPS\s+(\d+)",
            r"NEFT\s+([A-Z0-9]+)",
            r"RTGS\s+([A-Z0-9]+)",
            r"UPI\s+(\d+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("karnavati reference regex"))
        .collect()
    })
}

/// Payment-rail reference embedded in a narration, if any.
pub fn extract_txn_ref(narration: &str) -> Option<String> {
    reference_res()
        .iter()
        .find_map(|re| re.captures(narration))
        .map(|caps| caps[1].to_string())
}

pub struct KarnavatiProfile;

impl BankProfile for KarnavatiProfile {
    fn bank(&self) -> BankId {
        BankId::Karnavati
    }

    fn min_columns(&self) -> usize {
        7
    }

    fn role_map(&self, _rows: &[Vec<String>]) -> ColumnRoleMap {
        ColumnRoleMap::fixed(&[
            (Role::Date, TXN_DATE_COL),
            (Role::ValueDate, VALUE_DATE_COL),
            (Role::Narration, NARR_COL),
            (Role::Reference, REF_COL),
            (Role::DebitAmount, DEBIT_COL),
            (Role::CreditAmount, CREDIT_COL),
            (Role::Balance, BAL_COL),
        ])
    }

    fn is_header(&self, row: &[String]) -> bool {
        row.first()
            .is_some_and(|c| c.to_uppercase().starts_with("TRN"))
    }

    fn is_transaction_start(&self, row: &[String], roles: &ColumnRoleMap) -> bool {
        date_re().is_match(roles.cell(row, Role::Date))
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
        classify_split(&txn.amount, &[])
    }

    /// Falls back to `date_amount_balance`, which is not unique: two
    /// transactions on the same day with equal amount and balance collide.
    fn txn_id(&self, txn: &RawTransaction, amount: &str) -> String {
        extract_txn_ref(&txn.narration).unwrap_or_else(|| {
            format!(
                "{}_{}_{}",
                txn.date,
                amount,
                passbook_core::text::strip_thousands(&txn.balance)
            )
        })
    }
}
