//! Heuristic gate for the external sigmoidal dose-response fit.

/// SEM values at or above this percentage do not count as good points.
const SEM_THRESHOLD: f64 = 20.0;
/// The running good-point count must exceed this before the range check.
const MIN_GOOD_POINTS: usize = 5;

/// Decide whether a dose-response fit is statistically justified.
///
/// Walks the SEM series counting points below 20%; once more than five
/// good points are seen, the whole normalized series must span the
/// transition (max >= 60 and min <= 40) so the inflection lies inside
/// the tested range. Exhausting the series without enough good points is
/// an explicit `false`, not a fall-through.
pub fn should_fit(normalized: &[f64], sem: &[f64]) -> bool {
    let mut good = 0usize;
    for value in sem {
        if *value < SEM_THRESHOLD {
            good += 1;
        }
        if good > MIN_GOOD_POINTS {
            let max = normalized.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = normalized.iter().copied().fold(f64::INFINITY, f64::min);
            return max >= 60.0 && min <= 40.0;
        }
    }
    false
}
