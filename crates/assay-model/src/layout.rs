//! Per-plate layout: four parallel per-well arrays plus the well-role map.

use serde::{Deserialize, Serialize};

use crate::plate::PlateFormat;

/// The role a well plays in reference classification.
///
/// Exactly one role per well; `Unassigned` is reserved for wells with no
/// reading and for wells suppressed through the exceptions list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WellRole {
    Sample,
    Control,
    Solvent,
    Buffer,
    #[default]
    Unassigned,
}

impl WellRole {
    /// Legacy single-letter code used by the layout grid display.
    pub fn code(self) -> &'static str {
        match self {
            Self::Sample => "s",
            Self::Control => "r",
            Self::Solvent => "d",
            Self::Buffer => "b",
            Self::Unassigned => "",
        }
    }
}

/// One row per plate: protein ids, purification ids, concentrations and
/// well roles, all indexed by linear well index.
///
/// Invariant: the four arrays always have length == well count of the
/// plate format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub plate_id: String,
    pub format: PlateFormat,
    pub protein_ids: Vec<Option<i64>>,
    pub purification_ids: Vec<Option<String>>,
    pub concentrations: Vec<Option<f64>>,
    pub well_roles: Vec<WellRole>,
}

impl Layout {
    pub fn new(plate_id: impl Into<String>, format: PlateFormat) -> Self {
        let wells = format.wells();
        Self {
            plate_id: plate_id.into(),
            format,
            protein_ids: vec![None; wells],
            purification_ids: vec![None; wells],
            concentrations: vec![None; wells],
            well_roles: vec![WellRole::Unassigned; wells],
        }
    }

    pub fn role(&self, index: usize) -> WellRole {
        self.well_roles
            .get(index)
            .copied()
            .unwrap_or(WellRole::Unassigned)
    }

    pub fn set_role(&mut self, index: usize, role: WellRole) {
        if let Some(slot) = self.well_roles.get_mut(index) {
            *slot = role;
        }
    }

    /// Linear indices of every well carrying the given role.
    pub fn wells_with_role(&self, role: WellRole) -> Vec<usize> {
        self.well_roles
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == role)
            .map(|(index, _)| index)
            .collect()
    }

    /// All four parallel arrays agree with the plate format.
    pub fn is_consistent(&self) -> bool {
        let wells = self.format.wells();
        self.protein_ids.len() == wells
            && self.purification_ids.len() == wells
            && self.concentrations.len() == wells
            && self.well_roles.len() == wells
    }
}
