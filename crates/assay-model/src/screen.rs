//! Multi-condition phenotypic screen (CBCS) result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One screen condition: a display name plus the binary flags that make
/// it up (e.g. serum on/off, inhibitor on/off).
///
/// The designated reference condition is the one whose flags are all
/// false; detection is a pure function over the flag map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub flags: BTreeMap<String, bool>,
}

impl Condition {
    pub fn new(name: impl Into<String>, flags: BTreeMap<String, bool>) -> Self {
        Self {
            name: name.into(),
            flags,
        }
    }

    /// True when every binary flag is negative.
    pub fn is_all_negative(&self) -> bool {
        !self.flags.is_empty() && self.flags.values().all(|set| !set)
    }
}

/// Replicate-1 vs replicate-2 linear regression over percent-of-solvent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicateRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub pearson: f64,
}

/// Terminal state of one (concentration, condition) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Computed,
    /// Every replicate of every well was missing.
    SkippedNoData,
}

/// Aggregated results for one (concentration, condition) cell.
///
/// All per-well vectors are indexed by linear well index and use `None`
/// for wells that are absent from the sample population or whose value is
/// intentionally undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionCell {
    pub concentration: f64,
    pub condition: Condition,
    pub status: CellStatus,
    /// Replicate-averaged two-pass-normalized value per well.
    pub data: Vec<Option<f64>>,
    /// Raw value as percent of the solvent-reference mean, per well.
    pub percent_of_solvent: Vec<Option<f64>>,
    /// Solvent-reference raw readings that fed the percent channel.
    pub controls: Vec<f64>,
    pub regression: Option<ReplicateRegression>,
    /// Z-score per well over this cell's sample population.
    pub z_scores: Vec<Option<f64>>,
    /// Z-score minus the same well's Z-score under the reference
    /// condition; `None` screen-wide when no reference condition exists.
    pub delta_z_scores: Vec<Option<f64>>,
}

/// Cross-screen per-well summary: the most negative delta-Z observed for
/// the well over every (concentration, condition) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenWellSummary {
    pub well_index: usize,
    pub min_delta_z: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
        pairs
            .iter()
            .map(|(name, set)| ((*name).to_string(), *set))
            .collect()
    }

    #[test]
    fn all_negative_detection() {
        let reference = Condition::new("base", flags(&[("serum", false), ("drugx", false)]));
        let treated = Condition::new("serum", flags(&[("serum", true), ("drugx", false)]));
        assert!(reference.is_all_negative());
        assert!(!treated.is_all_negative());
    }

    #[test]
    fn empty_flag_set_is_not_a_reference() {
        let unnamed = Condition::new("x", BTreeMap::new());
        assert!(!unnamed.is_all_negative());
    }
}
