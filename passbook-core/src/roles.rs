//! Semantic column roles and the per-page mapping from role to column index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Date,
    ValueDate,
    Narration,
    Reference,
    DebitAmount,
    CreditAmount,
    SignedAmount,
    Balance,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Date,
        Role::ValueDate,
        Role::Narration,
        Role::Reference,
        Role::DebitAmount,
        Role::CreditAmount,
        Role::SignedAmount,
        Role::Balance,
    ];
}

/// How a [`ColumnRoleMap`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    /// Hardcoded indices.
    Static,
    /// Read from a header row on the page.
    Header,
    /// Header-detected layout but no header row on the page: every role is 0.
    Fallback,
}

/// Role → column index for one page.
///
/// Built fresh on every grouping call and never shared between pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoleMap {
    columns: BTreeMap<Role, usize>,
    source: RoleSource,
}

impl ColumnRoleMap {
    pub fn fixed(pairs: &[(Role, usize)]) -> Self {
        Self {
            columns: pairs.iter().copied().collect(),
            source: RoleSource::Static,
        }
    }

    /// Every listed role pointing at column 0.
    pub fn fallback(roles: &[Role]) -> Self {
        Self {
            columns: roles.iter().map(|r| (*r, 0)).collect(),
            source: RoleSource::Fallback,
        }
    }

    /// Start from the fallback and let header labels overwrite it.
    pub fn from_header(roles: &[Role], found: impl IntoIterator<Item = (Role, usize)>) -> Self {
        let mut map = Self::fallback(roles);
        for (role, idx) in found {
            map.columns.insert(role, idx);
        }
        map.source = RoleSource::Header;
        map
    }

    pub fn get(&self, role: Role) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn source(&self) -> RoleSource {
        self.source
    }

    /// Cell text for `role`, or an empty string when the role is unmapped or the row is short.
    pub fn cell<'r>(&self, row: &'r [String], role: Role) -> &'r str {
        self.get(role)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, usize)> + '_ {
        self.columns.iter().map(|(r, i)| (*r, *i))
    }
}
