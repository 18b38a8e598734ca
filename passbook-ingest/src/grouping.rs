//! Row grouping engine.
//!
//! Turns one page's raw rows into transaction groups under a [`BankProfile`],
//! then merges each group into a single [`RawTransaction`]. Everything here is
//! a pure function of `(profile, table)`: the role map is rebuilt on every
//! call, so pages can be processed in any order or in parallel.

use passbook_core::text::{is_blank_row, normalize_row};
use passbook_core::{
    ColumnRoleMap, RawAmount, RawTable, RawTransaction, Role, StructuredTransaction,
    TransactionGroup,
};

use crate::profiles::{AmountLayout, BankProfile, JoinPolicy};
use crate::structured::generate_structured_output;

/// Per-page counters. Malformed rows are only visible here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    pub rows: usize,
    pub malformed: usize,
    pub empty: usize,
    pub headers: usize,
    pub noise: usize,
    pub orphans: usize,
    pub groups: usize,
}

#[derive(Debug, Clone)]
pub struct PageGrouping {
    pub roles: ColumnRoleMap,
    pub groups: Vec<TransactionGroup>,
    pub stats: GroupingStats,
}

/// Partition a page's rows into transaction groups.
pub fn group_rows(profile: &dyn BankProfile, table: &RawTable) -> PageGrouping {
    let mut stats = GroupingStats {
        rows: table.len(),
        ..GroupingStats::default()
    };

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .filter_map(|raw| {
            if raw.len() < profile.min_columns() {
                stats.malformed += 1;
                return None;
            }
            let mut row = normalize_row(raw);
            profile.repair_row(&mut row);
            Some(row)
        })
        .collect();

    let roles = profile.role_map(&rows);

    let mut groups = Vec::new();
    let mut current: Option<TransactionGroup> = None;

    for row in rows {
        if is_blank_row(&row) {
            stats.empty += 1;
            continue;
        }
        if profile.is_header(&row) {
            stats.headers += 1;
            continue;
        }

        if profile.is_transaction_start(&row, &roles) {
            if let Some(done) = current.take() {
                groups.push(done);
            }
            current = Some(TransactionGroup::start(row));
            continue;
        }

        match current.as_mut() {
            Some(_) if profile.is_noise_row(&row) => stats.noise += 1,
            Some(group) => group.push_continuation(row),
            None => stats.orphans += 1,
        }
    }

    if let Some(done) = current.take() {
        groups.push(done);
    }
    stats.groups = groups.len();

    PageGrouping {
        roles,
        groups,
        stats,
    }
}

/// Merge every row of a group into one tuple, column by column.
pub fn merge_group(
    profile: &dyn BankProfile,
    group: &TransactionGroup,
    roles: &ColumnRoleMap,
) -> RawTransaction {
    let field = |role: Role| {
        let policy = profile.join_policy(role);
        let rows = match policy {
            JoinPolicy::StartRow => 1,
            _ => group.rows.len(),
        };
        let parts = group.rows.iter().take(rows).fold(Vec::new(), |acc, row| {
            profile.merge_continuation(role, acc, profile.role_text(row, role, roles))
        });
        policy.join(&parts)
    };

    let amount = match profile.amount_layout() {
        AmountLayout::Signed => RawAmount::Signed(field(Role::SignedAmount)),
        AmountLayout::Split => RawAmount::Split {
            debit: field(Role::DebitAmount),
            credit: field(Role::CreditAmount),
        },
    };

    RawTransaction {
        date: field(Role::Date),
        value_date: field(Role::ValueDate),
        narration: field(Role::Narration),
        reference: field(Role::Reference),
        amount,
        balance: field(Role::Balance),
    }
}

/// Group and merge one page.
pub fn group_transactions(profile: &dyn BankProfile, table: &RawTable) -> Vec<RawTransaction> {
    let PageGrouping {
        roles,
        groups,
        stats,
    } = group_rows(profile, table);

    log::debug!(
        "{}: {} rows -> {} groups (malformed={}, empty={}, headers={}, noise={}, orphans={}, roles={:?})",
        profile.bank().name(),
        stats.rows,
        stats.groups,
        stats.malformed,
        stats.empty,
        stats.headers,
        stats.noise,
        stats.orphans,
        roles.source(),
    );

    groups
        .iter()
        .map(|g| merge_group(profile, g, &roles))
        .collect()
}

/// Full per-page pipeline: group, merge, structure.
pub fn process_page(profile: &dyn BankProfile, table: &RawTable) -> Vec<StructuredTransaction> {
    generate_structured_output(profile, &group_transactions(profile, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::BankId;
    use crate::profiles::hdfc::HdfcProfile;
    use crate::profiles::kotak::KotakProfile;
    use passbook_core::RoleSource;

    fn strs(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn hdfc_row(date: &str, narr: &str, withdraw: &str) -> Vec<String> {
        let balance = if date.is_empty() { "" } else { "1.00" };
        strs(&[date, narr, "", "", withdraw, "", balance])
    }

    #[test]
    fn test_continuations_before_first_start_are_dropped() {
        let table = RawTable::from_text_rows(vec![
            hdfc_row("", "carried over from previous page", ""),
            hdfc_row("01/04/24", "FIRST", "10.00"),
            hdfc_row("", "wrapped", ""),
        ]);
        let grouping = group_rows(&HdfcProfile, &table);
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.stats.orphans, 1);
        assert_eq!(grouping.groups[0].continuations().len(), 1);
    }

    #[test]
    fn test_blank_and_null_rows_are_skipped() {
        let mut table = RawTable::from_text_rows(vec![hdfc_row("01/04/24", "A", "1.00")]);
        table.rows.push(vec![None; 7]);
        table.rows.push(vec![Some("   ".to_string()); 7]);

        let grouping = group_rows(&HdfcProfile, &table);
        assert_eq!(grouping.stats.empty, 2);
        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].rows.len(), 1);
    }

    #[test]
    fn test_short_rows_never_contribute() {
        let table = RawTable::from_text_rows(vec![
            hdfc_row("01/04/24", "A", "1.00"),
            strs(&["", "short continuation"]),
            strs(&["02/04/24", "short start"]),
        ]);
        let grouping = group_rows(&HdfcProfile, &table);
        assert_eq!(grouping.stats.malformed, 2);
        assert_eq!(grouping.groups.len(), 1);

        let merged = group_transactions(&HdfcProfile, &table);
        assert_eq!(merged[0].narration, "A");
    }

    #[test]
    fn test_group_count_matches_start_rows() {
        let table = RawTable::from_text_rows(vec![
            hdfc_row("01/04/24", "A", "1.00"),
            hdfc_row("", "a2", ""),
            hdfc_row("02/04/24", "B", "2.00"),
            hdfc_row("03/04/24", "C", "3.00"),
            hdfc_row("", "c2", ""),
            hdfc_row("", "c3", ""),
        ]);
        let grouping = group_rows(&HdfcProfile, &table);
        assert_eq!(grouping.stats.groups, 3);
        let sizes: Vec<usize> = grouping.groups.iter().map(|g| g.rows.len()).collect();
        assert_eq!(sizes, vec![2, 1, 3]);
    }

    #[test]
    fn test_role_map_is_rebuilt_per_call() {
        let with_header = RawTable::from_text_rows(vec![
            vec!["#", "TRANSACTION DATE", "DETAILS", "CHQ / REF NO.", "DEBIT/CREDIT", "BALANCE"],
            vec!["1", "01 Jun 2025", "UPI", "R1", "-5.00", "10.00"],
        ]);
        let without_header = RawTable::from_text_rows(vec![vec!["01 Jun 2025", "x"]]);

        let first = group_rows(&KotakProfile, &with_header);
        assert_eq!(first.roles.source(), RoleSource::Header);
        assert_eq!(first.roles.get(Role::Date), Some(1));

        let second = group_rows(&KotakProfile, &without_header);
        assert_eq!(second.roles.source(), RoleSource::Fallback);
        assert_eq!(second.roles.get(Role::Date), Some(0));
        assert_eq!(second.groups.len(), 1);
    }

    #[test]
    fn test_same_input_same_output() {
        let table = RawTable::from_text_rows(vec![
            hdfc_row("01/04/24", "A", "1.00"),
            hdfc_row("", "a2", ""),
        ]);
        let profile = BankId::Hdfc.profile();
        assert_eq!(process_page(profile, &table), process_page(profile, &table));
    }
}
