//! End-to-end dose-response reduction scenarios over the public API.

use std::sync::atomic::AtomicBool;

use assay_core::{PlateInput, process_plate, process_plates, resolve_samples};
use assay_model::{AssayRunContext, AssayType, PlateFormat, Reading, TransferEntry, WellTable};

fn entry(plate: &str, well: &str, id: Option<&str>, name: &str, conc: Option<f64>) -> TransferEntry {
    TransferEntry {
        destination_plate: plate.to_string(),
        destination_well: well.to_string(),
        sample_id: id.map(str::to_string),
        sample_name: name.to_string(),
        source_concentration: None,
        destination_concentration: conc,
        transfer_volume: Some(25.0),
    }
}

fn reference_plate(plate: &str) -> (WellTable, Vec<TransferEntry>) {
    let mut raw = WellTable::new(plate, PlateFormat::W384);
    let mut entries = Vec::new();
    for (i, well) in ["A1", "A2", "A3", "A4"].iter().enumerate() {
        entries.push(entry(plate, well, None, "DMSO", None));
        raw.set_reading(i, Reading::Scalar(100.0));
    }
    for (i, well) in ["B1", "B2", "B3", "B4"].iter().enumerate() {
        entries.push(entry(plate, well, Some("CTL"), "Control", Some(10.0)));
        raw.set_reading(24 + i, Reading::Scalar(20.0));
    }
    (raw, entries)
}

#[test]
fn duplicate_concentration_merges_into_replicate_group() {
    let entries = vec![
        entry("DP1", "C1", Some("CPD1"), "Compound 1", Some(10.0)),
        entry("DP1", "C2", Some("CPD1"), "Compound 1", Some(10.0)),
        entry("DP1", "C3", Some("CPD1"), "Compound 1", Some(1.0)),
    ];
    let samples = resolve_samples(&entries, PlateFormat::W384).expect("resolve");
    assert_eq!(samples.len(), 1);
    let cpd1 = &samples[0];
    assert_eq!(cpd1.concentrations, vec![10.0, 1.0]);
    assert_eq!(cpd1.locations[0].len(), 2);
    assert_eq!(cpd1.locations[1].len(), 1);
    assert_eq!(cpd1.well_count(), 3);
}

#[test]
fn htrf_reading_normalizes_against_plate_references() {
    let (mut raw, mut entries) = reference_plate("DP1");
    entries.push(entry("DP1", "C1", Some("CPD1"), "Compound 1", Some(10.0)));
    raw.set_reading(48, Reading::Scalar(60.0));

    let ctx = AssayRunContext::new(AssayType::Htrf, PlateFormat::W384);
    let result = process_plate(&ctx, &PlateInput { raw, entries }).expect("process");
    let sample = &result.samples[0];
    // Solvent mean 100, control mean 20, reading 60 -> 50.0%.
    assert_eq!(sample.points[0].normalized, Some(50.0));
}

#[test]
fn batch_keeps_good_plates_when_one_fails() {
    let ctx = AssayRunContext::new(AssayType::Htrf, PlateFormat::W384);
    let (raw1, entries1) = reference_plate("DP1");
    // Second plate has a transfer row addressing a nonexistent well.
    let (raw2, mut entries2) = reference_plate("DP2");
    entries2.push(entry("DP2", "ZZ99", Some("CPD9"), "Compound 9", Some(1.0)));

    let plates = vec![
        PlateInput {
            raw: raw1,
            entries: entries1,
        },
        PlateInput {
            raw: raw2,
            entries: entries2,
        },
    ];
    let abort = AtomicBool::new(false);
    let outcome = process_plates(&ctx, &plates, &|_progress| {}, &abort);
    assert_eq!(outcome.succeeded(), 1);
    assert!(outcome.results[0].is_some());
    assert!(outcome.results[1].is_none());
    assert_eq!(outcome.failures.len(), 1);
}

#[test]
fn progress_status_lines_reach_the_callback() {
    let ctx = AssayRunContext::new(AssayType::Htrf, PlateFormat::W384);
    let (raw, entries) = reference_plate("DP1");
    let plates = vec![PlateInput { raw, entries }];
    let abort = AtomicBool::new(false);
    let seen = std::sync::Mutex::new(Vec::new());
    let outcome = process_plates(
        &ctx,
        &plates,
        &|progress| seen.lock().unwrap().push((progress.completed, progress.total)),
        &abort,
    );
    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(seen.into_inner().unwrap(), vec![(1, 1)]);
}
