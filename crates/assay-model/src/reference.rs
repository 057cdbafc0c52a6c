//! Reference well classes and their summary statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reference classes used for normalization and QC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceClass {
    Solvent,
    Buffer,
    Control,
    SamplePopulation,
}

impl ReferenceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solvent => "Solvent",
            Self::Buffer => "Buffer",
            Self::Control => "Control",
            Self::SamplePopulation => "Samples",
        }
    }
}

/// Robust summary of one reference class.
///
/// Every statistic is optional: `None` means "intentionally undefined"
/// (too few values, or an undefined divisor), which is distinct from a
/// value that was computed as exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub n: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Standard error of the mean, stdev / sqrt(n), ddof = 1.
    pub sem: Option<f64>,
    /// Sample standard deviation, ddof = 1.
    pub stdev: Option<f64>,
    /// Median absolute deviation.
    pub mad: Option<f64>,
}

/// Well locations per reference class on one plate, plus the per-class
/// statistics once they have been computed.
///
/// Built once per plate by the classifier; the statistics columns are
/// merged in afterwards and the location sets never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceLocations {
    pub plate_id: String,
    pub wells: BTreeMap<ReferenceClass, Vec<usize>>,
    pub stats: BTreeMap<ReferenceClass, SummaryStats>,
}

impl ReferenceLocations {
    pub fn new(plate_id: impl Into<String>) -> Self {
        Self {
            plate_id: plate_id.into(),
            wells: BTreeMap::new(),
            stats: BTreeMap::new(),
        }
    }

    pub fn wells_of(&self, class: ReferenceClass) -> &[usize] {
        self.wells.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_class(&self, class: ReferenceClass) -> bool {
        !self.wells_of(class).is_empty()
    }

    pub fn stats_of(&self, class: ReferenceClass) -> Option<&SummaryStats> {
        self.stats.get(&class)
    }

    /// Mean of the class, `None` when the class is absent or undefined.
    pub fn mean_of(&self, class: ReferenceClass) -> Option<f64> {
        self.stats_of(class).and_then(|stats| stats.mean)
    }
}
