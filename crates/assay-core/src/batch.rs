//! Batch driver: per-unit fan-out, progress reporting, early abort.
//!
//! Units (plates, or samples for time-course runs) are independent; the
//! workers return owned result rows that are joined afterwards. Per-unit
//! failures become a `None` row plus a logged message and never escape
//! the driver. Abort is honored between units only, never mid-unit.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::warn;

use assay_model::{AssayRunContext, EngineError};

use crate::pipeline::{PlateInput, PlateResult, process_plate};

/// One progress notification, sent after each completed unit. The
/// callback runs on a worker thread and must not mutate engine state.
#[derive(Debug, Clone)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub status: String,
}

/// One failed unit, with the message already rendered for the log.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub unit: usize,
    pub message: String,
}

/// Joined batch output: `results[i]` is `None` when unit `i` failed or
/// was skipped by an abort.
#[derive(Debug)]
pub struct BatchOutcome<R> {
    pub results: Vec<Option<R>>,
    pub failures: Vec<BatchFailure>,
    pub aborted: bool,
}

impl<R> BatchOutcome<R> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }
}

/// The three container-level precondition checks, in their fixed order.
///
/// A batch that cannot establish any layout, transfer data, or raw data
/// must refuse to run and say why; this is distinct from a single bad
/// plate inside an otherwise healthy batch.
pub fn check_preconditions(
    has_layout: bool,
    has_transfer: bool,
    has_data: bool,
) -> assay_model::Result<()> {
    if !has_layout {
        return Err(EngineError::MissingLayout);
    }
    if !has_transfer {
        return Err(EngineError::MissingTransfer);
    }
    if !has_data {
        return Err(EngineError::NoDataFiles);
    }
    Ok(())
}

/// Fan `units` out over the rayon pool and join the results in order.
pub fn run_batch<U, R, F, P>(
    units: &[U],
    run: F,
    progress: &P,
    abort: &AtomicBool,
) -> BatchOutcome<R>
where
    U: Sync,
    R: Send,
    F: Fn(&U) -> anyhow::Result<R> + Send + Sync,
    P: Fn(Progress) + Send + Sync + ?Sized,
{
    let total = units.len();
    let completed = AtomicUsize::new(0);

    let raw: Vec<Option<Result<R, String>>> = units
        .par_iter()
        .enumerate()
        .map(|(unit, input)| {
            if abort.load(Ordering::SeqCst) {
                return None;
            }
            let result = run(input).map_err(|error| format!("{error:#}"));
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            let status = match &result {
                Ok(_) => format!("unit {}/{total} complete", unit + 1),
                Err(message) => format!("unit {} failed: {message}", unit + 1),
            };
            progress(Progress {
                completed: done,
                total,
                status,
            });
            Some(result)
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (unit, entry) in raw.into_iter().enumerate() {
        match entry {
            Some(Ok(result)) => results.push(Some(result)),
            Some(Err(message)) => {
                warn!(unit, %message, "batch unit failed; continuing with remaining units");
                failures.push(BatchFailure { unit, message });
                results.push(None);
            }
            None => results.push(None),
        }
    }

    BatchOutcome {
        results,
        failures,
        aborted: abort.load(Ordering::SeqCst),
    }
}

/// Dose-response batch: one unit per plate.
pub fn process_plates<P>(
    ctx: &AssayRunContext,
    plates: &[PlateInput],
    progress: &P,
    abort: &AtomicBool,
) -> BatchOutcome<PlateResult>
where
    P: Fn(Progress) + Send + Sync + ?Sized,
{
    run_batch(plates, |plate| process_plate(ctx, plate), progress, abort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn preconditions_check_in_order() {
        assert!(matches!(
            check_preconditions(false, false, false),
            Err(EngineError::MissingLayout)
        ));
        assert!(matches!(
            check_preconditions(true, false, false),
            Err(EngineError::MissingTransfer)
        ));
        assert!(matches!(
            check_preconditions(true, true, false),
            Err(EngineError::NoDataFiles)
        ));
        assert!(check_preconditions(true, true, true).is_ok());
    }

    #[test]
    fn failed_units_become_none_rows() {
        let units = vec![1u32, 2, 3];
        let abort = AtomicBool::new(false);
        let outcome = run_batch(
            &units,
            |unit| {
                if *unit == 2 {
                    anyhow::bail!("bad plate");
                }
                Ok(*unit * 10)
            },
            &|_progress| {},
            &abort,
        );
        assert_eq!(outcome.results, vec![Some(10), None, Some(30)]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].unit, 1);
        assert_eq!(outcome.succeeded(), 2);
        assert!(!outcome.aborted);
    }

    #[test]
    fn progress_fires_once_per_completed_unit() {
        let units = vec![0u32; 8];
        let abort = AtomicBool::new(false);
        let seen = Mutex::new(Vec::new());
        let outcome = run_batch(
            &units,
            |_| Ok(()),
            &|progress: Progress| seen.lock().unwrap().push(progress.completed),
            &abort,
        );
        assert_eq!(outcome.succeeded(), 8);
        let mut counts = seen.into_inner().unwrap();
        counts.sort_unstable();
        assert_eq!(counts, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn abort_skips_remaining_units() {
        let units = vec![0u32; 4];
        let abort = AtomicBool::new(true);
        let outcome = run_batch(&units, |_| Ok(()), &|_p| {}, &abort);
        assert!(outcome.aborted);
        assert_eq!(outcome.succeeded(), 0);
        assert!(outcome.results.iter().all(Option::is_none));
    }
}
