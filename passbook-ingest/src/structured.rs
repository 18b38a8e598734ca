//! Merged transaction tuples → canonical output records.

use passbook_core::text::magnitude;
use passbook_core::{RawTransaction, StructuredTransaction};

use crate::profiles::BankProfile;

/// Classify and reshape merged tuples. Output records own fresh strings and
/// keep nothing from the merge step. `amount` is forced to a magnitude
/// whatever the profile returned.
pub fn generate_structured_output(
    profile: &dyn BankProfile,
    grouped: &[RawTransaction],
) -> Vec<StructuredTransaction> {
    grouped
        .iter()
        .map(|txn| {
            let (amount, txn_type) = profile.classify(txn);
            let amount = magnitude(&amount);
            StructuredTransaction {
                date: txn.date.clone(),
                txn_id: profile.txn_id(txn, &amount),
                remarks: txn.narration.clone(),
                balance: profile.clean_balance(&txn.balance),
                amount,
                txn_type,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::BankId;
    use passbook_core::{RawAmount, TxnType};

    fn signed(amount: &str) -> RawTransaction {
        RawTransaction {
            date: "01/04/24".to_string(),
            value_date: String::new(),
            narration: "ATM".to_string(),
            reference: "R1".to_string(),
            amount: RawAmount::Signed(amount.to_string()),
            balance: "1,000.00".to_string(),
        }
    }

    #[test]
    fn test_sign_conventions_are_deterministic() {
        let cases = [
            (BankId::Hdfc, "-619.00", "619.00", TxnType::Debit),
            (BankId::Hdfc, "+100.00", "100.00", TxnType::Credit),
            (BankId::Kotak, "-619.00", "619.00", TxnType::Debit),
            (BankId::Union, "619.00(Dr)", "619.00", TxnType::Debit),
            (BankId::Union, "619.00(Cr)", "619.00", TxnType::Credit),
        ];
        for (bank, raw, amount, txn_type) in cases {
            let out = generate_structured_output(bank.profile(), &[signed(raw)]);
            assert_eq!(out[0].amount, amount, "{bank:?} {raw}");
            assert_eq!(out[0].txn_type, txn_type, "{bank:?} {raw}");
        }
    }

    #[test]
    fn test_debit_credit_pair_with_sentinel() {
        let txn = RawTransaction {
            amount: RawAmount::Split {
                debit: "NA".to_string(),
                credit: "150.00".to_string(),
            },
            ..signed("")
        };
        let out = generate_structured_output(BankId::Icici.profile(), &[txn]);
        assert_eq!(out[0].amount, "150.00");
        assert_eq!(out[0].txn_type, TxnType::Credit);
    }

    #[test]
    fn test_amount_never_carries_a_sign() {
        for bank in BankId::ALL {
            for raw in ["-1.00", "+2.00", "3.00(Dr)", "4.00(Cr)", "5.00", ""] {
                let out = generate_structured_output(bank.profile(), &[signed(raw)]);
                assert!(!out[0].amount.contains(['-', '+']), "{bank:?} {raw}");
            }
        }
    }

    #[test]
    fn test_balance_drops_separators() {
        let out = generate_structured_output(BankId::Hdfc.profile(), &[signed("-1.00")]);
        assert_eq!(out[0].balance, "1000.00");
        assert_eq!(out[0].txn_id, "R1");
        assert_eq!(out[0].remarks, "ATM");
    }
}
