//! Per-capillary analysis and per-protein-group delta-Tm.

use std::collections::BTreeMap;

use tracing::debug;

use assay_core::mean;
use assay_model::{EngineWarning, FluorescenceBand, ThermalShiftSample};

use crate::series::{derivative, local_maxima, normalize_unit};

/// Points averaged for the initial-fluorescence band.
const INITIAL_POINTS: usize = 10;

/// One well/capillary handed over by the raw parser plus the layout.
#[derive(Debug, Clone)]
pub struct CapillaryInput {
    pub well_index: usize,
    pub sample_id: String,
    /// Protein group, from the layout's purification id.
    pub purification_id: Option<String>,
    /// Whether the layout marks this well as a reference for its group.
    pub is_reference: bool,
    /// Raw fluorescence/ratio series over temperature.
    pub series: Vec<(f64, f64)>,
}

/// Plate-level output: per-capillary rows, the per-group reference
/// average Tm, and the warnings collected along the way.
#[derive(Debug, Clone)]
pub struct ThermalShiftResult {
    pub samples: Vec<ThermalShiftSample>,
    pub reference_tm: BTreeMap<String, f64>,
    pub warnings: Vec<EngineWarning>,
}

/// Analyze one capillary: unit-scale the signal, band the initial
/// fluorescence, differentiate, and collect candidate inflections.
///
/// A flat series yields no normalized curve and no inflections, plus a
/// warning; the capillary row itself is kept.
pub fn analyze_capillary(
    plate_id: &str,
    input: &CapillaryInput,
) -> (ThermalShiftSample, Option<EngineWarning>) {
    let raw_derivative = derivative(&input.series);
    let (normalized, warning) = match normalize_unit(&input.series) {
        Some(normalized) => (normalized, None),
        None => (
            Vec::new(),
            Some(EngineWarning::FlatSeries {
                plate: plate_id.to_string(),
                well: input.well_index.to_string(),
            }),
        ),
    };
    let normalized_derivative = derivative(&normalized);
    let inflections = local_maxima(&normalized_derivative);
    let initial_fluorescence = initial_band(&normalized);

    let sample = ThermalShiftSample {
        well_index: input.well_index,
        sample_id: input.sample_id.clone(),
        purification_id: input.purification_id.clone(),
        raw: input.series.clone(),
        normalized,
        initial_fluorescence,
        raw_derivative,
        normalized_derivative,
        inflections,
        delta_tm: None,
    };
    (sample, warning)
}

/// Analyze every capillary of a plate and compute delta-Tm per protein
/// group.
///
/// Groups with no reference capillary keep delta-Tm undefined for every
/// member and surface a warning; their melting temperatures alone remain
/// usable.
pub fn analyze_plate(plate_id: &str, inputs: &[CapillaryInput]) -> ThermalShiftResult {
    let mut warnings = Vec::new();
    let mut samples = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (sample, warning) = analyze_capillary(plate_id, input);
        warnings.extend(warning);
        samples.push(sample);
    }

    // Group membership and reference flags come from the inputs; the
    // primary Tm comes from the analyzed rows, index-aligned above.
    let mut group_members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut reference_tms: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (position, input) in inputs.iter().enumerate() {
        let Some(group) = input.purification_id.as_ref() else {
            continue;
        };
        group_members.entry(group.clone()).or_default().push(position);
        if input.is_reference
            && let Some(tm) = samples[position].primary_tm()
        {
            reference_tms.entry(group.clone()).or_default().push(tm);
        }
    }

    let mut reference_tm = BTreeMap::new();
    for (group, members) in &group_members {
        match reference_tms.get(group).and_then(|tms| mean(tms)) {
            Some(average) => {
                reference_tm.insert(group.clone(), average);
                for &position in members {
                    samples[position].delta_tm =
                        samples[position].primary_tm().map(|tm| tm - average);
                }
            }
            None => {
                debug!(group = %group, "no reference capillaries; delta-Tm stays undefined");
                warnings.push(EngineWarning::NoGroupReference {
                    group: group.clone(),
                });
            }
        }
    }

    ThermalShiftResult {
        samples,
        reference_tm,
        warnings,
    }
}

/// Band the initial fluorescence from the mean of the first ten
/// normalized points: `< 0.3` low, `< 0.5` medium, otherwise high.
fn initial_band(normalized: &[(f64, f64)]) -> Option<FluorescenceBand> {
    if normalized.is_empty() {
        return None;
    }
    let count = normalized.len().min(INITIAL_POINTS);
    let values: Vec<f64> = normalized[..count].iter().map(|(_, y)| *y).collect();
    let initial = mean(&values)?;
    Some(if initial < 0.3 {
        FluorescenceBand::Low
    } else if initial < 0.5 {
        FluorescenceBand::Medium
    } else {
        FluorescenceBand::High
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigmoid_capillary(
        well_index: usize,
        tm: f64,
        group: Option<&str>,
        is_reference: bool,
    ) -> CapillaryInput {
        let series = (30..=70)
            .map(|t| {
                let t = t as f64;
                (t, 100.0 + 900.0 / (1.0 + (-(t - tm)).exp()))
            })
            .collect();
        CapillaryInput {
            well_index,
            sample_id: format!("S{well_index}"),
            purification_id: group.map(str::to_string),
            is_reference,
            series,
        }
    }

    #[test]
    fn detects_the_melting_temperature() {
        let input = sigmoid_capillary(0, 52.0, None, false);
        let (sample, warning) = analyze_capillary("TP1", &input);
        assert!(warning.is_none());
        assert_eq!(sample.primary_tm(), Some(52.0));
        assert_eq!(sample.initial_fluorescence, Some(FluorescenceBand::Low));
    }

    #[test]
    fn group_reference_average_and_delta() {
        let inputs = vec![
            sigmoid_capillary(0, 45.0, Some("P1"), true),
            sigmoid_capillary(1, 47.0, Some("P1"), true),
            sigmoid_capillary(2, 50.0, Some("P1"), false),
        ];
        let result = analyze_plate("TP1", &inputs);
        assert_eq!(result.reference_tm.get("P1"), Some(&46.0));
        let sample = &result.samples[2];
        assert_eq!(sample.delta_tm, Some(4.0));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn group_without_references_warns_and_stays_undefined() {
        let inputs = vec![
            sigmoid_capillary(0, 45.0, Some("P2"), false),
            sigmoid_capillary(1, 48.0, Some("P2"), false),
        ];
        let result = analyze_plate("TP1", &inputs);
        assert!(result.reference_tm.is_empty());
        assert!(result.samples.iter().all(|s| s.delta_tm.is_none()));
        assert_eq!(
            result.warnings,
            vec![EngineWarning::NoGroupReference {
                group: "P2".to_string()
            }]
        );
        // Tm itself is still reported.
        assert_eq!(result.samples[0].primary_tm(), Some(45.0));
    }

    #[test]
    fn flat_capillary_is_skipped_with_a_warning() {
        let flat = CapillaryInput {
            well_index: 3,
            sample_id: "S3".to_string(),
            purification_id: Some("P1".to_string()),
            is_reference: false,
            series: (30..=70).map(|t| (t as f64, 500.0)).collect(),
        };
        let (sample, warning) = analyze_capillary("TP1", &flat);
        assert!(matches!(warning, Some(EngineWarning::FlatSeries { .. })));
        assert!(sample.normalized.is_empty());
        assert!(sample.inflections.is_empty());
        assert_eq!(sample.primary_tm(), None);
    }
}
