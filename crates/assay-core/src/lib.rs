pub mod batch;
pub mod classify;
pub mod fitgate;
pub mod normalize;
pub mod pipeline;
pub mod reference_stats;
pub mod resolver;
pub mod stats;

pub use batch::{
    BatchFailure, BatchOutcome, Progress, check_preconditions, process_plates, run_batch,
};
pub use classify::{ClassifiedPlate, classify_plate};
pub use fitgate::should_fit;
pub use normalize::{normalize, reference_value};
pub use pipeline::{PlateInput, PlateResult, process_plate};
pub use reference_stats::{ZPrime, summarize_references, z_prime};
pub use resolver::resolve_samples;
pub use stats::{linear_regression, mad, mean, median, round2, sem, stdev, summarize};
