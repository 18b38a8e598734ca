use passbook_core::RawTable;
use passbook_ingest::{BankId, MemoryDocument, Orchestrator, group_rows, process_page};
use proptest::prelude::*;

/// One generated HDFC row: a start row tagged `T<n>` or a wrapped fragment.
#[derive(Debug, Clone)]
enum Line {
    Start { debit: bool, amount: u32 },
    Wrap(String),
    Blank,
}

fn line() -> impl Strategy<Value = Line> {
    prop_oneof![
        3 => (any::<bool>(), 1u32..100_000).prop_map(|(debit, amount)| Line::Start { debit, amount }),
        2 => "[a-z]{1,5}".prop_map(Line::Wrap),
        1 => Just(Line::Blank),
    ]
}

fn render(lines: &[Line]) -> (RawTable, usize) {
    let mut starts = 0;
    let rows: Vec<Vec<String>> = lines
        .iter()
        .map(|l| match l {
            Line::Start { debit, amount } => {
                let tag = format!("T{starts}");
                starts += 1;
                let amt = format!("{amount}.00");
                let (w, d) = if *debit { (amt, String::new()) } else { (String::new(), amt) };
                vec!["01/04/24".into(), tag, "R".into(), "01/04/24".into(), w, d, "5.00".into()]
            }
            Line::Wrap(text) => vec![
                String::new(),
                text.clone(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
            Line::Blank => vec![String::new(); 7],
        })
        .collect();
    (RawTable::from_text_rows(rows), starts)
}

proptest! {
    #[test]
    fn prop_one_transaction_per_start_row(lines in prop::collection::vec(line(), 0..40)) {
        let (page, starts) = render(&lines);
        let txns = process_page(BankId::Hdfc.profile(), &page);
        prop_assert_eq!(txns.len(), starts);
        prop_assert_eq!(group_rows(BankId::Hdfc.profile(), &page).stats.groups, starts);
    }

    #[test]
    fn prop_order_follows_start_rows(lines in prop::collection::vec(line(), 0..40)) {
        let (page, _) = render(&lines);
        let txns = process_page(BankId::Hdfc.profile(), &page);
        for (i, t) in txns.iter().enumerate() {
            let tag = format!("T{i}");
            prop_assert!(
                t.remarks == tag || t.remarks.starts_with(&format!("{tag} ")),
                "remarks {:?} should start with {}", t.remarks, tag
            );
        }
    }

    #[test]
    fn prop_reprocessing_is_identical(lines in prop::collection::vec(line(), 0..40)) {
        let (page, _) = render(&lines);
        let profile = BankId::Hdfc.profile();
        let first = serde_json::to_string(&process_page(profile, &page)).unwrap();
        let second = serde_json::to_string(&process_page(profile, &page)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_amount_is_magnitude(lines in prop::collection::vec(line(), 0..40)) {
        let (page, _) = render(&lines);
        for t in process_page(BankId::Hdfc.profile(), &page) {
            prop_assert!(!t.amount.starts_with('-') && !t.amount.starts_with('+'));
        }
    }

    #[test]
    fn prop_batch_preserves_page_order(
        pages in prop::collection::vec(prop::collection::vec(line(), 0..10), 1..5)
    ) {
        let tables: Vec<RawTable> = pages.iter().map(|p| render(p).0).collect();
        let expected: Vec<_> = tables
            .iter()
            .flat_map(|t| process_page(BankId::Hdfc.profile(), t))
            .collect();

        let report = Orchestrator::for_bank(BankId::Hdfc).run_batch(&MemoryDocument::new(tables), None);
        prop_assert_eq!(report.pages.len(), pages.len());
        let pages_in_order = report.pages.iter().enumerate().all(|(i, p)| p.page == i + 1);
        prop_assert!(pages_in_order);
        prop_assert_eq!(report.into_transactions(), expected);
    }
}
