//! Boundary parsing for the reduction engine: the liquid-handler
//! transfer report and the already-tabulated raw-reader table.
//!
//! Instrument-specific raw formats (Columbus, Harmony, BMG, LightCycler,
//! Prometheus) are parsed by external collaborators; this crate only
//! checks the structure of what they hand over and converts it into the
//! engine's types.

pub mod error;
pub mod polars_utils;
pub mod raw;
pub mod transfer;

pub use error::{IngestError, Result};
pub use polars_utils::{any_to_f64, any_to_string, any_to_string_non_empty};
pub use raw::{read_raw_csv, well_table_from_frame};
pub use transfer::{TransferReport, parse_transfer_report, read_transfer_report};
