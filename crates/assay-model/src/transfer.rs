//! Liquid-handler transfer records and the resolved per-sample table.

use serde::{Deserialize, Serialize};

/// One physical liquid transfer, as parsed from the transfer report's
/// details section. Rows with a null transfer volume are discarded by the
/// resolver before any classification happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub destination_plate: String,
    pub destination_well: String,
    /// `None` for solvent-only (backfill) dispenses.
    pub sample_id: Option<String>,
    pub sample_name: String,
    pub source_concentration: Option<f64>,
    pub destination_concentration: Option<f64>,
    pub transfer_volume: Option<f64>,
}

impl TransferEntry {
    /// True when this record dispenses a real sample rather than solvent.
    pub fn has_sample(&self) -> bool {
        self.sample_id.is_some()
    }

    /// True when the sample name marks a control-compound well.
    pub fn is_control(&self) -> bool {
        self.sample_name.eq_ignore_ascii_case("Control")
    }
}

/// One resolved sample on one destination plate.
///
/// `concentrations` is sorted descending; `locations[i]` holds the linear
/// well indices of every replicate dispensed at `concentrations[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSample {
    pub destination_plate: String,
    pub sample_id: String,
    pub sample_name: String,
    pub concentrations: Vec<f64>,
    pub locations: Vec<Vec<usize>>,
}

impl ResolvedSample {
    /// Total number of wells across all replicate groups.
    pub fn well_count(&self) -> usize {
        self.locations.iter().map(Vec::len).sum()
    }
}
