//! Contract tests for the thermal-shift plate analysis.

use assay_thermal::{CapillaryInput, analyze_plate};

fn capillary(well: usize, tm: f64, group: &str, is_reference: bool) -> CapillaryInput {
    // nanoDSF-style 350/330 ratio ramp with a single transition at `tm`.
    let series = (20..=95)
        .map(|t| {
            let t = t as f64;
            (t, 0.8 + 0.4 / (1.0 + (-(t - tm) / 2.0).exp()))
        })
        .collect();
    CapillaryInput {
        well_index: well,
        sample_id: format!("capillary-{well}"),
        purification_id: Some(group.to_string()),
        is_reference,
        series,
    }
}

#[test]
fn shifts_are_relative_to_the_group_reference_average() {
    let inputs = vec![
        capillary(0, 45.0, "P1", true),
        capillary(1, 47.0, "P1", true),
        capillary(2, 50.0, "P1", false),
        capillary(3, 44.0, "P1", false),
    ];
    let result = analyze_plate("NT1", &inputs);
    assert_eq!(result.reference_tm.get("P1"), Some(&46.0));
    assert_eq!(result.samples[2].delta_tm, Some(4.0));
    assert_eq!(result.samples[3].delta_tm, Some(-2.0));
    // Reference capillaries get a shift against their own average too.
    assert_eq!(result.samples[0].delta_tm, Some(-1.0));
}

#[test]
fn groups_are_independent() {
    let inputs = vec![
        capillary(0, 45.0, "P1", true),
        capillary(1, 50.0, "P1", false),
        capillary(2, 60.0, "P2", false),
    ];
    let result = analyze_plate("NT1", &inputs);
    assert_eq!(result.samples[1].delta_tm, Some(5.0));
    // P2 has no reference: undefined shift, usable Tm, one warning.
    assert_eq!(result.samples[2].delta_tm, None);
    assert_eq!(result.samples[2].primary_tm(), Some(60.0));
    assert_eq!(result.warnings.len(), 1);
}
