//! Thermal-shift engine: melting-temperature detection and per-group
//! delta-Tm for DSF/nanoDSF plates.

pub mod engine;
pub mod series;

pub use engine::{CapillaryInput, ThermalShiftResult, analyze_capillary, analyze_plate};
pub use series::{derivative, local_maxima, normalize_unit};
