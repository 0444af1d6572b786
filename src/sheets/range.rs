// src/sheets/range.rs
//! A1 notation helpers.
//!
//! Builders produce the ranges sent to the Sheets API (`Deals!2:2`,
//! `Deals!A:ZZ`); the parser is used by the in-memory store to slice a grid
//! the same way the API does.

use super::error::{SheetError, SheetResult};

/// Columns covered by an append. Appends target the whole used span of the tab.
pub const APPEND_COLUMNS: &str = "A:ZZ";

/// Quotes a tab name for use in a range when it holds anything other than
/// ASCII alphanumerics or underscores.
pub fn quote_tab(tab: &str) -> String {
    let plain = !tab.is_empty() && tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        tab.to_string()
    } else {
        format!("'{}'", tab.replace('\'', "''"))
    }
}

/// `Tab` or `Tab!range`.
pub fn tab_range(tab: &str, range: Option<&str>) -> String {
    match range {
        Some(r) if !r.is_empty() => format!("{}!{}", quote_tab(tab), r),
        _ => quote_tab(tab),
    }
}

/// The whole physical row `row` (1-based).
pub fn row_range(tab: &str, row: usize) -> String {
    format!("{}!{}:{}", quote_tab(tab), row, row)
}

pub fn append_range(tab: &str) -> String {
    format!("{}!{}", quote_tab(tab), APPEND_COLUMNS)
}

/// `A` -> 0, `Z` -> 25, `AA` -> 26.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// A parsed `A1:B2`-style range without its tab prefix. Rows are 1-based,
/// columns 0-based; `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRange {
    pub first_row: Option<usize>,
    pub last_row: Option<usize>,
    pub first_col: Option<usize>,
    pub last_col: Option<usize>,
}

impl CellRange {
    pub fn parse(range: &str) -> SheetResult<Self> {
        let invalid = || SheetError::Config(format!("Unable to parse range: {}", range));
        let (start, end) = match range.split_once(':') {
            Some((s, e)) => (s, e),
            None => (range, range),
        };
        let (first_col, first_row) = parse_endpoint(start).ok_or_else(invalid)?;
        let (last_col, last_row) = parse_endpoint(end).ok_or_else(invalid)?;
        if first_col.is_none() && first_row.is_none() {
            return Err(invalid());
        }
        if matches!(first_row, Some(0)) || matches!(last_row, Some(0)) {
            return Err(invalid());
        }
        Ok(Self { first_row, last_row, first_col, last_col })
    }

    /// Cuts the range out of `grid`, dropping trailing empty cells and rows
    /// the way the Sheets API omits them.
    pub fn slice(&self, grid: &[Vec<String>]) -> Vec<Vec<String>> {
        let first_row = self.first_row.unwrap_or(1);
        let last_row = self.last_row.unwrap_or(usize::MAX);
        let first_col = self.first_col.unwrap_or(0);
        let last_col = self.last_col.unwrap_or(usize::MAX);

        let mut rows: Vec<Vec<String>> = grid
            .iter()
            .enumerate()
            .filter(|(i, _)| *i + 1 >= first_row && *i + 1 <= last_row)
            .map(|(_, row)| {
                let cells = row
                    .iter()
                    .enumerate()
                    .filter(|(c, _)| *c >= first_col && *c <= last_col)
                    .map(|(_, cell)| cell.clone())
                    .collect();
                trim_trailing_empty(cells)
            })
            .collect();

        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        rows
    }
}

pub fn trim_trailing_empty(mut cells: Vec<String>) -> Vec<String> {
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn parse_endpoint(part: &str) -> Option<(Option<usize>, Option<usize>)> {
    let part = part.trim().replace('$', "");
    if part.is_empty() {
        return None;
    }
    let split = part.find(|c: char| c.is_ascii_digit()).unwrap_or(part.len());
    let (letters, digits) = part.split_at(split);
    let col = if letters.is_empty() { None } else { Some(column_index(letters)?) };
    let row = if digits.is_empty() { None } else { Some(digits.parse::<usize>().ok()?) };
    Some((col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_quote_tab() {
        assert_eq!(quote_tab("Deals"), "Deals");
        assert_eq!(quote_tab("Deal Registrations"), "'Deal Registrations'");
        assert_eq!(quote_tab("Partner's"), "'Partner''s'");
    }

    #[test]
    fn test_builders() {
        assert_eq!(tab_range("Deals", None), "Deals");
        assert_eq!(tab_range("Deals", Some("A1:C3")), "Deals!A1:C3");
        assert_eq!(row_range("Deals", 2), "Deals!2:2");
        assert_eq!(append_range("Admins"), "Admins!A:ZZ");
        assert_eq!(row_range("Q3 Deals", 7), "'Q3 Deals'!7:7");
    }

    #[test]
    fn test_column_letters_roundtrip() {
        for (letters, index) in [("A", 0), ("Z", 25), ("AA", 26), ("AZ", 51), ("ZZ", 701)] {
            assert_eq!(column_index(letters), Some(index));
            assert_eq!(column_letters(index), letters);
        }
        assert_eq!(column_index("a"), Some(0));
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            CellRange::parse("A1:C3").unwrap(),
            CellRange { first_row: Some(1), last_row: Some(3), first_col: Some(0), last_col: Some(2) }
        );
        assert_eq!(
            CellRange::parse("2:2").unwrap(),
            CellRange { first_row: Some(2), last_row: Some(2), first_col: None, last_col: None }
        );
        assert_eq!(
            CellRange::parse("A:ZZ").unwrap(),
            CellRange { first_row: None, last_row: None, first_col: Some(0), last_col: Some(701) }
        );
        assert_eq!(
            CellRange::parse("B2").unwrap(),
            CellRange { first_row: Some(2), last_row: Some(2), first_col: Some(1), last_col: Some(1) }
        );
        assert!(CellRange::parse("").is_err());
        assert!(CellRange::parse("A0:B2").is_err());
        assert!(CellRange::parse("1A").is_err());
    }

    #[test]
    fn test_slice_trims_like_the_api() {
        let data = grid(&[
            &["id", "name", "status"],
            &["D1", "Acme", ""],
            &["", "", ""],
        ]);
        let all = CellRange::default().slice(&data);
        assert_eq!(all, grid(&[&["id", "name", "status"], &["D1", "Acme"]]));

        let cols = CellRange::parse("B1:C2").unwrap().slice(&data);
        assert_eq!(cols, grid(&[&["name", "status"], &["Acme"]]));
    }
}
