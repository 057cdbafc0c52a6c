//! Dose-response results: one processed row per sample id.

use serde::{Deserialize, Serialize};

/// Raw and derived values for one concentration step of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationPoint {
    pub concentration: f64,
    /// Raw replicate readings at this concentration, plate order.
    pub raw: Vec<f64>,
    /// Statistics of the raw replicate group.
    pub mean: Option<f64>,
    pub sem: Option<f64>,
    pub stdev: Option<f64>,
    /// Mean percent-of-reference over the normalized replicates, `None`
    /// when normalization failed for this sample.
    pub normalized: Option<f64>,
    /// SEM of the normalized replicates, percent scale. This is what the
    /// fit gate thresholds against.
    pub normalized_sem: Option<f64>,
    /// Point excluded from fitting by the operator.
    pub excluded: bool,
}

/// Parameters handed back by the external curve-fit solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub parameters: Vec<f64>,
    pub confidence_interval: Vec<f64>,
    pub r_squared: f64,
}

/// One row per sample id on one destination plate.
///
/// Created empty by the resolver, populated incrementally by the
/// normalizer and fit gate, then frozen when handed to reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedSample {
    pub destination_plate: String,
    pub sample_id: String,
    pub sample_name: String,
    /// Concentration-descending series.
    pub points: Vec<ConcentrationPoint>,
    /// Whether a sigmoidal fit is statistically justified.
    pub do_fit: bool,
    pub fit: Option<FitResult>,
}

impl ProcessedSample {
    /// Normalized values in concentration order, skipping undefined points.
    pub fn normalized_series(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.normalized).collect()
    }

    /// Percent-scale SEM values in concentration order, skipping
    /// undefined points.
    pub fn sem_series(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.normalized_sem).collect()
    }
}
