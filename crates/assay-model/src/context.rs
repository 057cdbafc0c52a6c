//! Immutable per-run context passed into every pipeline stage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::plate::{PlateFormat, WellAddress};

/// Assay technology, selects the normalization formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssayType {
    Htrf,
    AlphaScreen,
    /// Luminescence "Glo" family readouts.
    Glo,
    /// Fluorescence polarization.
    Polarization,
}

impl AssayType {
    /// True for the inhibition-style formula shared by HTRF, AlphaScreen
    /// and the Glo readouts.
    pub fn is_inhibition_style(self) -> bool {
        !matches!(self, Self::Polarization)
    }
}

/// Everything a pipeline stage needs to know about the run, fixed before
/// any computation starts and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssayRunContext {
    pub assay_type: AssayType,
    pub plate_format: PlateFormat,
    /// Wells suppressed from classification (e.g. known bad dispenses).
    pub exceptions: BTreeSet<WellAddress>,
}

impl AssayRunContext {
    pub fn new(assay_type: AssayType, plate_format: PlateFormat) -> Self {
        Self {
            assay_type,
            plate_format,
            exceptions: BTreeSet::new(),
        }
    }

    pub fn with_exceptions(mut self, exceptions: BTreeSet<WellAddress>) -> Self {
        self.exceptions = exceptions
            .into_iter()
            .map(|address| {
                let well = self.canonical_well(&address.well);
                WellAddress {
                    plate: address.plate,
                    well,
                }
            })
            .collect();
        self
    }

    /// True when the given well on the given plate is excluded from
    /// classification.
    pub fn is_exception(&self, plate: &str, well: &str) -> bool {
        self.exceptions
            .contains(&WellAddress::new(plate, self.canonical_well(well)))
    }

    /// Collapse case and zero padding ("a01" -> "A1") so exception rows
    /// match no matter how the well was spelled in the report.
    fn canonical_well(&self, well: &str) -> String {
        self.plate_format
            .index_of(well)
            .and_then(|index| self.plate_format.name_of(index))
            .unwrap_or_else(|| well.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_spellings_are_canonicalized() {
        let mut exceptions = BTreeSet::new();
        exceptions.insert(WellAddress::new("DP1", "a01"));
        let ctx =
            AssayRunContext::new(AssayType::Htrf, PlateFormat::W384).with_exceptions(exceptions);
        assert!(ctx.is_exception("DP1", "A1"));
        assert!(ctx.is_exception("DP1", "A01"));
        assert!(!ctx.is_exception("DP1", "A2"));
        assert!(!ctx.is_exception("DP2", "A1"));
    }

    #[test]
    fn unparseable_exception_wells_match_verbatim() {
        let mut exceptions = BTreeSet::new();
        exceptions.insert(WellAddress::new("DP1", "ZZ99"));
        let ctx =
            AssayRunContext::new(AssayType::Htrf, PlateFormat::W96).with_exceptions(exceptions);
        assert!(ctx.is_exception("DP1", "ZZ99"));
    }
}
