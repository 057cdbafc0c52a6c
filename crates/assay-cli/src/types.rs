//! Report types shared by the summary tables and the JSON export.

use std::collections::BTreeMap;

use serde::Serialize;

use assay_core::{PlateResult, ZPrime};
use assay_model::{
    Condition, ConditionCell, Layout, ProcessedSample, ReferenceLocations, ScreenWellSummary,
    ThermalShiftSample,
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ZPrimeReport {
    pub mean_based: Option<f64>,
    pub robust: Option<f64>,
}

impl From<ZPrime> for ZPrimeReport {
    fn from(z: ZPrime) -> Self {
        Self {
            mean_based: z.mean_based,
            robust: z.robust,
        }
    }
}

/// One reduced plate, warnings already rendered for display.
#[derive(Debug, Clone, Serialize)]
pub struct PlateReport {
    pub plate_id: String,
    pub z_prime: ZPrimeReport,
    pub layout: Layout,
    pub references: ReferenceLocations,
    pub samples: Vec<ProcessedSample>,
    pub warnings: Vec<String>,
}

impl From<PlateResult> for PlateReport {
    fn from(result: PlateResult) -> Self {
        Self {
            plate_id: result.plate_id,
            z_prime: result.z_prime.into(),
            layout: result.layout,
            references: result.references,
            samples: result.samples,
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReduceReport {
    pub assay_type: String,
    pub plates: Vec<PlateReport>,
    /// Per-plate failures; the batch keeps going past them.
    pub failures: Vec<String>,
}

impl ReduceReport {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermalReport {
    pub plate_id: String,
    pub samples: Vec<ThermalShiftSample>,
    /// Reference-average melting temperature per protein group.
    pub reference_tm: BTreeMap<String, f64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenReport {
    pub cells: Vec<ConditionCell>,
    pub summaries: Vec<ScreenWellSummary>,
    pub reference_condition: Option<Condition>,
    pub warnings: Vec<String>,
}
