//! Engine error taxonomy and non-fatal warnings.

use thiserror::Error;

/// Normalization failures: a ratio was required against a zero or
/// undefined reference. Fatal for the affected sample's normalized value
/// only; the sample stays in the output marked not-fit-attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    #[error("reference value is undefined on plate {plate}")]
    UndefinedReference { plate: String },

    #[error("reference value is zero on plate {plate}")]
    ZeroReference { plate: String },

    #[error("control divisor is zero on plate {plate}")]
    ZeroControl { plate: String },
}

/// Errors raised by the reduction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or absent transfer description. Fatal for the plate,
    /// the batch continues with the remaining plates flagged.
    #[error("transfer description error: {reason}")]
    TransferFormat { reason: String },

    /// Raw table failed a structural sanity check. Fatal for the plate.
    #[error("raw data error on plate {plate}: {reason}")]
    RawDataFormat { plate: String, reason: String },

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    // Batch preconditions, checked in this order before any computation.
    #[error("no layout data assigned; cannot run analysis")]
    MissingLayout,

    #[error("no transfer description assigned; cannot run analysis")]
    MissingTransfer,

    #[error("no raw data files assigned; cannot run analysis")]
    NoDataFiles,
}

/// Non-fatal conditions surfaced through the progress log.
///
/// Downstream statistics for the affected class are reported as
/// undefined; the batch keeps running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineWarning {
    #[error("no {class} wells found on plate {plate}")]
    NoReference { plate: String, class: String },

    #[error("normalization failed for sample {sample} on plate {plate}; marked not-fit-attempted")]
    NormalizationFailed { plate: String, sample: String },

    #[error("protein group {group} has no reference wells; delta-Tm left undefined")]
    NoGroupReference { group: String },

    #[error("flat signal in well {well} on plate {plate}; capillary skipped")]
    FlatSeries { plate: String, well: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages_are_distinct() {
        let messages = [
            EngineError::MissingLayout.to_string(),
            EngineError::MissingTransfer.to_string(),
            EngineError::NoDataFiles.to_string(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
    }

    #[test]
    fn normalization_error_converts() {
        let err: EngineError = NormalizationError::ZeroReference {
            plate: "DP1".into(),
        }
        .into();
        assert!(matches!(err, EngineError::Normalization(_)));
    }
}
