//! Summary statistics over well-reading slices.
//!
//! Every function returns `None` instead of a sentinel when the statistic
//! is undefined for the input size, so "no value" stays distinguishable
//! from "computed as zero" at every consumer.

use assay_model::{ReplicateRegression, SummaryStats};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation, ddof = 1. Undefined below two values.
pub fn stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Standard error of the mean, stdev / sqrt(n).
pub fn sem(values: &[f64]) -> Option<f64> {
    Some(stdev(values)? / (values.len() as f64).sqrt())
}

/// Median absolute deviation: median of |x - median(x)|.
pub fn mad(values: &[f64]) -> Option<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Full summary of one value set.
pub fn summarize(values: &[f64]) -> SummaryStats {
    SummaryStats {
        n: values.len(),
        mean: mean(values),
        median: median(values),
        sem: sem(values),
        stdev: stdev(values),
        mad: mad(values),
    }
}

/// Round to two decimal places, the precision reported for percentages.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Least-squares regression of `ys` on `xs`, plus Pearson correlation.
///
/// Undefined when fewer than two pairs exist or either side has zero
/// variance.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<ReplicateRegression> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        ss_xx += (x - mean_x) * (x - mean_x);
        ss_yy += (y - mean_y) * (y - mean_y);
        ss_xy += (x - mean_x) * (y - mean_y);
    }
    if ss_xx == 0.0 || ss_yy == 0.0 {
        return None;
    }
    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let pearson = ss_xy / (ss_xx.sqrt() * ss_yy.sqrt());
    Some(ReplicateRegression {
        slope,
        intercept,
        r_squared: pearson * pearson,
        pearson,
    })
}
