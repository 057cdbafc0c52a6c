//! Multi-condition phenotypic screen aggregation (CBCS).
//!
//! One screen spans a 3-dimensional condition x concentration x replicate
//! space of plates. Each plate is normalized on its own (two-pass
//! column/row median normalization plus an independent percent-of-solvent
//! channel); cells are then aggregated across replicates and scored
//! against the designated all-negative reference condition.

pub mod aggregate;
pub mod normalize;

pub use aggregate::{ScreenResult, aggregate};
pub use normalize::{NormalizedPlate, ScreenPlate, normalize_plate};
