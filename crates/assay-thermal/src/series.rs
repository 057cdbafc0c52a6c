//! Numeric passes over one capillary's temperature series.

use assay_model::Inflection;

/// Scale a series into [0, 1] using its own min/max.
///
/// Returns `None` for a flat or too-short series; dividing by a zero
/// span is never attempted.
pub fn normalize_unit(series: &[(f64, f64)]) -> Option<Vec<(f64, f64)>> {
    if series.len() < 2 {
        return None;
    }
    let min = series.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max = series
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span == 0.0 {
        return None;
    }
    Some(
        series
            .iter()
            .map(|(x, y)| (*x, (y - min) / span))
            .collect(),
    )
}

/// Central-difference first derivative over the interior points.
pub fn derivative(series: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if series.len() < 3 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(series.len() - 2);
    for window in series.windows(3) {
        let (x0, y0) = window[0];
        let (x1, _) = window[1];
        let (x2, y2) = window[2];
        let dx = x2 - x0;
        if dx != 0.0 {
            out.push((x1, (y2 - y0) / dx));
        }
    }
    out
}

/// Local maxima of a derivative curve, steepest first.
///
/// A point is a candidate when it is strictly greater than both
/// neighbors; plateaus do not produce candidates.
pub fn local_maxima(derivative: &[(f64, f64)]) -> Vec<Inflection> {
    let mut candidates: Vec<Inflection> = derivative
        .windows(3)
        .filter(|window| window[1].1 > window[0].1 && window[1].1 > window[2].1)
        .map(|window| Inflection {
            temperature: window[1].0,
            slope: window[1].1,
        })
        .collect();
    candidates.sort_by(|a, b| b.slope.total_cmp(&a.slope));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigmoid(tm: f64) -> Vec<(f64, f64)> {
        (30..=70)
            .map(|t| {
                let t = t as f64;
                (t, 1.0 / (1.0 + (-(t - tm)).exp()))
            })
            .collect()
    }

    #[test]
    fn normalizes_to_unit_interval() {
        let series = vec![(1.0, 10.0), (2.0, 20.0), (3.0, 15.0)];
        let normalized = normalize_unit(&series).unwrap();
        assert_eq!(normalized[0].1, 0.0);
        assert_eq!(normalized[1].1, 1.0);
        assert_eq!(normalized[2].1, 0.5);
    }

    #[test]
    fn flat_series_is_rejected() {
        let series = vec![(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)];
        assert!(normalize_unit(&series).is_none());
    }

    #[test]
    fn derivative_of_a_line_is_constant() {
        let series: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64)).collect();
        let deriv = derivative(&series);
        assert_eq!(deriv.len(), 8);
        assert!(deriv.iter().all(|(_, d)| (d - 2.0).abs() < 1e-12));
    }

    #[test]
    fn sigmoid_peak_sits_at_the_midpoint() {
        let deriv = derivative(&sigmoid(45.0));
        let maxima = local_maxima(&deriv);
        assert!(!maxima.is_empty());
        assert_eq!(maxima[0].temperature, 45.0);
    }
}
