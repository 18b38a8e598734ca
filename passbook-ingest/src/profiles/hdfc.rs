//! HDFC Bank statement profile
//!
//! Expected table layout (7 columns, fixed):
//!   Date | Narration | Chq./Ref.No. | Value Dt | Withdrawal Amt. | Deposit Amt. | Closing Balance
//!   01/04/24 | UPI-SWIGGY-... | 0000412345678901 | 01/04/24 | 619.00 | | 10,000.00
//!
//! Narration wraps onto following rows with an empty date cell. The last page
//! ends with a statement summary block that must not merge into the final
//! transaction.

use passbook_core::{ColumnRoleMap, RawTransaction, Role, TxnType};
use regex::Regex;
use std::sync::OnceLock;

use super::{AmountLayout, BankId, BankProfile, JoinPolicy, classify_sign_prefix, contains_marker};

const DATE_COL: usize = 0;
const NARR_COL: usize = 1;
const REF_COL: usize = 2;
const VALUE_DT_COL: usize = 3;
const WITHDRAW_COL: usize = 4;
const DEPOSIT_COL: usize = 5;
const BAL_COL: usize = 6;

const FOOTER_MARKERS: &[&str] = &[
    "STATEMENT SUMMARY",
    "OPENING BALANCE",
    "DR COUNT",
    "CR COUNT",
    "DEBITS",
    "CREDITS",
    "GENERATED ON",
    "GENERATED BY",
    "REQUESTING BRANCH CODE",
    "COMPUTER GENERATED",
    "NOT REQUIRE SIGNATURE",
];

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{2}$").expect("hdfc date regex"))
}

pub struct HdfcProfile;

impl BankProfile for HdfcProfile {
    fn bank(&self) -> BankId {
        BankId::Hdfc
    }

    fn min_columns(&self) -> usize {
        7
    }

    fn role_map(&self, _rows: &[Vec<String>]) -> ColumnRoleMap {
        ColumnRoleMap::fixed(&[
            (Role::Date, DATE_COL),
            (Role::Narration, NARR_COL),
            (Role::Reference, REF_COL),
            (Role::ValueDate, VALUE_DT_COL),
            (Role::DebitAmount, WITHDRAW_COL),
            (Role::CreditAmount, DEPOSIT_COL),
            (Role::Balance, BAL_COL),
        ])
    }

    fn is_header(&self, row: &[String]) -> bool {
        row.first().map(String::as_str) == Some("Date")
            && row.get(1).is_some_and(|c| c.contains("Narration"))
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
            Role::Narration => JoinPolicy::Space,
            Role::Reference => JoinPolicy::Concat,
            _ => JoinPolicy::StartRow,
        }
    }

    /// The signed amount is built per row from the withdrawal/deposit pair,
    /// so a merged group carries `-619.00` or `+100.00`.
    fn role_text(&self, row: &[String], role: Role, roles: &ColumnRoleMap) -> String {
        match role {
            Role::SignedAmount => {
                let withdraw = roles.cell(row, Role::DebitAmount);
                let deposit = roles.cell(row, Role::CreditAmount);
                if !withdraw.is_empty() {
                    format!("-{withdraw}")
                } else if !deposit.is_empty() {
                    format!("+{deposit}")
                } else {
                    String::new()
                }
            }
            _ => roles.cell(row, role).to_string(),
        }
    }

    fn classify(&self, txn: &RawTransaction) -> (String, TxnType) {
        match &txn.amount {
            passbook_core::RawAmount::Signed(s) => classify_sign_prefix(s),
            other => super::classify_split(other, &[]),
        }
    }
}
