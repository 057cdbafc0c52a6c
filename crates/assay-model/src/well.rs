//! Raw per-well readings as handed over by the instrument parsers.

use serde::{Deserialize, Serialize};

use crate::plate::PlateFormat;

/// A single well's raw measurement.
///
/// Endpoint assays carry a scalar; kinetic and thermal assays carry a
/// series of `(x, y)` points where `x` is time or temperature. Absent data
/// is `Missing`, never a sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Reading {
    Scalar(f64),
    Series(Vec<(f64, f64)>),
    Missing,
}

impl Reading {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The scalar value, if this is an endpoint reading.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// The series points, if this is a kinetic/thermal reading.
    pub fn series(&self) -> Option<&[(f64, f64)]> {
        match self {
            Self::Series(points) => Some(points),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellReading {
    /// Zero-based linear well index.
    pub index: usize,
    pub reading: Reading,
}

/// One row per well on a plate, ordered by linear index.
///
/// Immutable once built by the ingest boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellTable {
    pub plate_id: String,
    pub format: PlateFormat,
    pub wells: Vec<WellReading>,
}

impl WellTable {
    pub fn new(plate_id: impl Into<String>, format: PlateFormat) -> Self {
        let wells = (0..format.wells())
            .map(|index| WellReading {
                index,
                reading: Reading::Missing,
            })
            .collect();
        Self {
            plate_id: plate_id.into(),
            format,
            wells,
        }
    }

    pub fn reading(&self, index: usize) -> Option<&Reading> {
        self.wells.get(index).map(|well| &well.reading)
    }

    /// Scalar value at `index`, `None` when missing or a series.
    pub fn scalar(&self, index: usize) -> Option<f64> {
        self.reading(index).and_then(Reading::scalar)
    }

    /// True when the well holds any reading at all.
    pub fn has_reading(&self, index: usize) -> bool {
        self.reading(index).is_some_and(|r| !r.is_missing())
    }

    pub fn set_reading(&mut self, index: usize, reading: Reading) {
        if let Some(well) = self.wells.get_mut(index) {
            well.reading = reading;
        }
    }
}
