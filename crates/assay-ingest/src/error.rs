//! Error types for assay data ingestion.

use std::path::PathBuf;

use thiserror::Error;

use assay_model::EngineError;

/// Errors that can occur while parsing the transfer report or checking
/// the raw-reader table.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Transfer Report Errors ===
    /// The report has no [DETAILS] section, so no transfer rows can be
    /// resolved. This is fatal for the plate set the report covers.
    #[error("transfer report has no [DETAILS] section")]
    MissingDetailsSection,

    /// Required column missing from a report section.
    #[error("required column '{column}' not found in {section} section")]
    MissingColumn { column: String, section: String },

    /// A row failed CSV parsing.
    #[error("malformed transfer row at line {line}: {message}")]
    MalformedRow { line: usize, message: String },

    /// A value could not be interpreted.
    #[error("invalid {field} value '{value}' at line {line}")]
    InvalidValue {
        field: String,
        value: String,
        line: usize,
    },

    // === Raw Table Errors ===
    /// Column not found in the raw DataFrame.
    #[error("column '{column}' not found in raw table for plate {plate}")]
    RawColumnNotFound { column: String, plate: String },

    /// A well coordinate does not exist on the declared plate format.
    #[error("unknown well '{well}' in raw table for plate {plate}")]
    UnknownWell { well: String, plate: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<IngestError> for EngineError {
    fn from(err: IngestError) -> Self {
        match &err {
            IngestError::RawColumnNotFound { plate, .. }
            | IngestError::UnknownWell { plate, .. } => EngineError::RawDataFormat {
                plate: plate.clone(),
                reason: err.to_string(),
            },
            _ => EngineError::TransferFormat {
                reason: err.to_string(),
            },
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::MissingDetailsSection;
        assert_eq!(err.to_string(), "transfer report has no [DETAILS] section");
    }

    #[test]
    fn raw_errors_map_to_raw_data_format() {
        let err: EngineError = IngestError::UnknownWell {
            well: "Z9".to_string(),
            plate: "DP1".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::RawDataFormat { .. }));
    }
}
