//! Plate geometry: well name to linear index conversion.
//!
//! Wells are addressed either by name (`"A1"`, `"P24"`, `"AF48"`) or by a
//! zero-based linear index in row-major order. Row letters run `A..Z` and
//! continue `AA..AF` for 1536-well plates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported plate formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateFormat {
    W96,
    W384,
    W1536,
}

impl PlateFormat {
    /// Total number of wells.
    pub fn wells(self) -> usize {
        match self {
            Self::W96 => 96,
            Self::W384 => 384,
            Self::W1536 => 1536,
        }
    }

    /// Number of rows (A..).
    pub fn rows(self) -> usize {
        match self {
            Self::W96 => 8,
            Self::W384 => 16,
            Self::W1536 => 32,
        }
    }

    /// Number of columns (1..).
    pub fn columns(self) -> usize {
        match self {
            Self::W96 => 12,
            Self::W384 => 24,
            Self::W1536 => 48,
        }
    }

    /// Parse a well name such as `"A1"`, `"B03"` or `"AF48"` into a linear
    /// index. Returns `None` when the name does not address a well on this
    /// format.
    pub fn index_of(self, name: &str) -> Option<usize> {
        let trimmed = name.trim();
        let split = trimmed
            .find(|ch: char| ch.is_ascii_digit())
            .filter(|&pos| pos > 0)?;
        let (letters, digits) = trimmed.split_at(split);
        let row = parse_row_letters(letters)?;
        let column: usize = digits.parse().ok()?;
        if row >= self.rows() || column == 0 || column > self.columns() {
            return None;
        }
        Some(row * self.columns() + (column - 1))
    }

    /// Format a linear index back into a well name (`"A1"` style, no zero
    /// padding). Returns `None` when the index is out of range.
    pub fn name_of(self, index: usize) -> Option<String> {
        if index >= self.wells() {
            return None;
        }
        let row = index / self.columns();
        let column = index % self.columns() + 1;
        Some(format!("{}{column}", row_letters(row)))
    }

    /// Split a linear index into (row, column), both zero-based.
    pub fn row_column(self, index: usize) -> Option<(usize, usize)> {
        if index >= self.wells() {
            return None;
        }
        Some((index / self.columns(), index % self.columns()))
    }
}

fn parse_row_letters(letters: &str) -> Option<usize> {
    let upper = letters.to_ascii_uppercase();
    let mut chars = upper.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), None, _) if first.is_ascii_uppercase() => Some(first as usize - 'A' as usize),
        (Some('A'), Some(second), None) if second.is_ascii_uppercase() => {
            Some(26 + second as usize - 'A' as usize)
        }
        _ => None,
    }
}

fn row_letters(row: usize) -> String {
    if row < 26 {
        char::from(b'A' + row as u8).to_string()
    } else {
        format!("A{}", char::from(b'A' + (row - 26) as u8))
    }
}

/// A plate-qualified well coordinate, as it appears in transfer reports.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WellAddress {
    pub plate: String,
    pub well: String,
}

impl WellAddress {
    pub fn new(plate: impl Into<String>, well: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
            well: well.into(),
        }
    }
}

impl fmt::Display for WellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plate, self.well)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_96() {
        let fmt = PlateFormat::W96;
        assert_eq!(fmt.index_of("A1"), Some(0));
        assert_eq!(fmt.index_of("A12"), Some(11));
        assert_eq!(fmt.index_of("H12"), Some(95));
        assert_eq!(fmt.name_of(95).as_deref(), Some("H12"));
    }

    #[test]
    fn accepts_zero_padded_columns() {
        assert_eq!(PlateFormat::W384.index_of("B03"), Some(26));
        assert_eq!(PlateFormat::W384.index_of("b3"), Some(26));
    }

    #[test]
    fn double_letter_rows_1536() {
        let fmt = PlateFormat::W1536;
        assert_eq!(fmt.index_of("AA1"), Some(26 * 48));
        assert_eq!(fmt.index_of("AF48"), Some(1535));
        assert_eq!(fmt.name_of(1535).as_deref(), Some("AF48"));
    }

    #[test]
    fn addresses_key_ordered_sets() {
        let mut set = std::collections::BTreeSet::new();
        set.insert(WellAddress::new("DP2", "A1"));
        set.insert(WellAddress::new("DP1", "B3"));
        assert!(set.contains(&WellAddress::new("DP1", "B3")));
        let first = set.iter().next().unwrap();
        assert_eq!(first.plate, "DP1");
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(PlateFormat::W96.index_of("I1"), None);
        assert_eq!(PlateFormat::W96.index_of("A13"), None);
        assert_eq!(PlateFormat::W96.index_of("A0"), None);
        assert_eq!(PlateFormat::W96.index_of(""), None);
        assert_eq!(PlateFormat::W96.name_of(96), None);
    }
}
