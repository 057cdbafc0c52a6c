//! Thermal-shift (DSF/nanoDSF) per-capillary results.

use serde::{Deserialize, Serialize};

/// Initial-fluorescence band, used by plotting and QC filters.
///
/// Classified from the mean of the first ten normalized points:
/// `< 0.3` low, `< 0.5` medium, otherwise high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FluorescenceBand {
    Low,
    Medium,
    High,
}

/// One candidate melting transition: the temperature of a local maximum
/// of the first derivative, together with the derivative value there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inflection {
    pub temperature: f64,
    pub slope: f64,
}

/// One row per well/capillary of a thermal-shift plate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalShiftSample {
    pub well_index: usize,
    pub sample_id: String,
    /// Protein group, from the layout's purification id.
    pub purification_id: Option<String>,
    pub raw: Vec<(f64, f64)>,
    /// Min/max-scaled signal, empty when the raw series is flat.
    pub normalized: Vec<(f64, f64)>,
    pub initial_fluorescence: Option<FluorescenceBand>,
    pub raw_derivative: Vec<(f64, f64)>,
    pub normalized_derivative: Vec<(f64, f64)>,
    /// Candidate inflections, steepest first.
    pub inflections: Vec<Inflection>,
    /// Own primary Tm minus the protein group's reference-average Tm.
    /// `None` until a reference average exists for the group.
    pub delta_tm: Option<f64>,
}

impl ThermalShiftSample {
    /// The steepest transition, treated as the melting temperature.
    pub fn primary_tm(&self) -> Option<f64> {
        self.inflections.first().map(|i| i.temperature)
    }
}
