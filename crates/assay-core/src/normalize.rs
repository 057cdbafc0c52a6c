//! Assay-type-specific normalization to percent-of-reference.

use assay_model::{AssayType, NormalizationError, ReferenceClass, ReferenceLocations};

use crate::stats::round2;

/// Reference and control means for a plate.
///
/// Reference = (solvent mean - control mean) when solvent wells exist,
/// otherwise (buffer mean - control mean); the control mean defaults to 0
/// when no control wells exist. A zero or undefined reference is an
/// error: the ratio below must never silently produce inf/NaN.
pub fn reference_value(
    references: &ReferenceLocations,
) -> Result<(f64, f64), NormalizationError> {
    let control = references.mean_of(ReferenceClass::Control).unwrap_or(0.0);
    let base = references
        .mean_of(ReferenceClass::Solvent)
        .or_else(|| references.mean_of(ReferenceClass::Buffer))
        .ok_or_else(|| NormalizationError::UndefinedReference {
            plate: references.plate_id.clone(),
        })?;
    let reference = base - control;
    if reference == 0.0 {
        return Err(NormalizationError::ZeroReference {
            plate: references.plate_id.clone(),
        });
    }
    Ok((reference, control))
}

/// Normalize raw readings into percentages, rounded to two decimals.
///
/// HTRF / AlphaScreen / Glo: `100 * (1 - (x - control) / reference)`.
/// Polarization: `control' = control - reference`;
/// `100 * (x - reference) / control'`.
pub fn normalize(
    readings: &[f64],
    assay_type: AssayType,
    references: &ReferenceLocations,
) -> Result<Vec<f64>, NormalizationError> {
    let (reference, control) = reference_value(references)?;
    if assay_type.is_inhibition_style() {
        Ok(readings
            .iter()
            .map(|x| round2(100.0 * (1.0 - (x - control) / reference)))
            .collect())
    } else {
        let control_prime = control - reference;
        if control_prime == 0.0 {
            return Err(NormalizationError::ZeroControl {
                plate: references.plate_id.clone(),
            });
        }
        Ok(readings
            .iter()
            .map(|x| round2(100.0 * (x - reference) / control_prime))
            .collect())
    }
}
