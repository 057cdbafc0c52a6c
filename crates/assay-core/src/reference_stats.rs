//! Per-class reference statistics and the Z-prime quality metric.

use assay_model::{ReferenceClass, ReferenceLocations, WellTable};

use crate::stats::summarize;

/// Mean-based and robust (median/MAD) Z-prime.
///
/// Both sides are `None`, not an error, when the Control class is absent
/// or the separation denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZPrime {
    pub mean_based: Option<f64>,
    pub robust: Option<f64>,
}

/// Fill the summary statistics for every populated reference class from
/// the plate's scalar readings. Missing readings are skipped; a class
/// with zero non-missing values keeps fully undefined statistics.
pub fn summarize_references(references: &mut ReferenceLocations, raw: &WellTable) {
    let classes: Vec<ReferenceClass> = references.wells.keys().copied().collect();
    for class in classes {
        let values: Vec<f64> = references
            .wells_of(class)
            .iter()
            .filter_map(|&index| raw.scalar(index))
            .collect();
        references.stats.insert(class, summarize(&values));
    }
}

/// Z' = 1 - 3 (sigma_ref + sigma_control) / |mu_ref - mu_control|.
///
/// The reference side is Solvent when present, otherwise Buffer. The
/// robust variant substitutes median for mean and MAD for stdev.
pub fn z_prime(references: &ReferenceLocations) -> ZPrime {
    let control = references.stats_of(ReferenceClass::Control);
    let reference = if references.has_class(ReferenceClass::Solvent) {
        references.stats_of(ReferenceClass::Solvent)
    } else {
        references.stats_of(ReferenceClass::Buffer)
    };
    let (Some(control), Some(reference)) = (control, reference) else {
        return ZPrime::default();
    };

    let mean_based = compute(
        reference.mean,
        reference.stdev,
        control.mean,
        control.stdev,
    );
    let robust = compute(
        reference.median,
        reference.mad,
        control.median,
        control.mad,
    );
    ZPrime { mean_based, robust }
}

fn compute(
    mu_ref: Option<f64>,
    sigma_ref: Option<f64>,
    mu_ctl: Option<f64>,
    sigma_ctl: Option<f64>,
) -> Option<f64> {
    let separation = (mu_ref? - mu_ctl?).abs();
    if separation == 0.0 {
        return None;
    }
    Some(1.0 - 3.0 * (sigma_ref? + sigma_ctl?) / separation)
}
