pub mod context;
pub mod error;
pub mod layout;
pub mod plate;
pub mod processed;
pub mod reference;
pub mod screen;
pub mod thermal;
pub mod transfer;
pub mod well;

pub use context::{AssayRunContext, AssayType};
pub use error::{EngineError, EngineWarning, NormalizationError, Result};
pub use layout::{Layout, WellRole};
pub use plate::{PlateFormat, WellAddress};
pub use processed::{ConcentrationPoint, FitResult, ProcessedSample};
pub use reference::{ReferenceClass, ReferenceLocations, SummaryStats};
pub use screen::{CellStatus, Condition, ConditionCell, ReplicateRegression, ScreenWellSummary};
pub use thermal::{FluorescenceBand, Inflection, ThermalShiftSample};
pub use transfer::{ResolvedSample, TransferEntry};
pub use well::{Reading, WellReading, WellTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_serializes() {
        let layout = Layout::new("DP-001", PlateFormat::W384);
        let json = serde_json::to_string(&layout).expect("serialize layout");
        let round: Layout = serde_json::from_str(&json).expect("deserialize layout");
        assert_eq!(round.plate_id, "DP-001");
        assert_eq!(round.well_roles.len(), 384);
    }

    #[test]
    fn summary_stats_default_is_undefined() {
        let stats = SummaryStats::default();
        assert_eq!(stats.n, 0);
        assert!(stats.mean.is_none());
        assert!(stats.stdev.is_none());
    }
}
