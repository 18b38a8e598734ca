//! Cell text normalization and numeric-text helpers.

use crate::types::RawCell;

/// Trim and collapse internal whitespace (including newlines) to single spaces.
pub fn normalize_cell(cell: &RawCell) -> String {
    match cell {
        Some(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
        None => String::new(),
    }
}

pub fn normalize_row(row: &[RawCell]) -> Vec<String> {
    row.iter().map(normalize_cell).collect()
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.is_empty())
}

/// Drop thousands separators. Indian grouping (`5,44,651.07`) is handled the same way.
pub fn strip_thousands(s: &str) -> String {
    s.replace(',', "").trim().to_string()
}

/// Amount text with separators and every sign character removed.
pub fn magnitude(s: &str) -> String {
    strip_thousands(s).replace(['-', '+'], "")
}

/// Uppercased text with all whitespace removed, for keyword matching that
/// must not depend on how the extractor split words.
pub fn compact_upper(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_newlines() {
        let cell = Some("  UPI/1234\n  /PAYTM \t QR ".to_string());
        assert_eq!(normalize_cell(&cell), "UPI/1234 /PAYTM QR");
        assert_eq!(normalize_cell(&None), "");
    }

    #[test]
    fn test_strip_thousands() {
        assert_eq!(strip_thousands("5,44,651.07"), "544651.07");
        assert_eq!(strip_thousands(" 1,309.13 "), "1309.13");
    }

    #[test]
    fn test_magnitude() {
        assert_eq!(magnitude("-1,619.00"), "1619.00");
        assert_eq!(magnitude("+100.00"), "100.00");
    }

    #[test]
    fn test_compact_upper() {
        assert_eq!(compact_upper("Statement  Summary"), "STATEMENTSUMMARY");
    }
}
