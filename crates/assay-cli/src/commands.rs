use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use tracing::{info, warn};

use assay_core::{Progress, check_preconditions, process_plates};
use assay_ingest::{any_to_f64, any_to_string, any_to_string_non_empty, read_raw_csv,
    read_transfer_report};
use assay_model::{AssayRunContext, EngineError, PlateFormat, TransferEntry};
use assay_screen::{ScreenPlate, aggregate};
use assay_thermal::{CapillaryInput, analyze_plate};

use crate::cli::{ReduceArgs, ScreenArgs, ThermalArgs};
use crate::types::{PlateReport, ReduceReport, ScreenReport, ThermalReport};

pub fn run_reduce(args: &ReduceArgs) -> Result<ReduceReport> {
    let run_folder = &args.run_folder;
    let transfer_path = args
        .transfer
        .clone()
        .unwrap_or_else(|| run_folder.join("transfer.csv"));

    // The transfer report is the layout source for the run.
    if !transfer_path.exists() {
        return Err(anyhow::Error::from(EngineError::MissingLayout).context(format!(
            "transfer report {} not found",
            transfer_path.display()
        )));
    }
    let transfer = read_transfer_report(&transfer_path)?;
    let raw_files = discover_raw_files(run_folder, &transfer_path)?;
    check_preconditions(true, !transfer.entries.is_empty(), !raw_files.is_empty())?;

    let format = args.plate_format.to_plate_format();
    let ctx = AssayRunContext::new(args.assay_type.to_assay_type(), format)
        .with_exceptions(transfer.exceptions.clone());

    // Transfer rows per destination plate.
    let mut entries_by_plate: BTreeMap<String, Vec<TransferEntry>> = BTreeMap::new();
    for entry in &transfer.entries {
        entries_by_plate
            .entry(entry.destination_plate.clone())
            .or_default()
            .push(entry.clone());
    }

    let ingest_start = Instant::now();
    let mut inputs = Vec::new();
    for path in &raw_files {
        let plate_id = file_stem(path);
        let Some(entries) = entries_by_plate.remove(&plate_id) else {
            warn!(plate = %plate_id, "raw file has no transfer rows; skipping");
            continue;
        };
        let raw = read_raw_csv(path, &plate_id, format, &args.well_column, &args.value_column)?;
        inputs.push(assay_core::PlateInput { raw, entries });
    }
    for plate_id in entries_by_plate.keys() {
        warn!(plate = %plate_id, "transfer rows have no raw file; skipping");
    }
    if inputs.is_empty() {
        return Err(EngineError::NoDataFiles.into());
    }
    info!(
        plate_count = inputs.len(),
        duration_ms = ingest_start.elapsed().as_millis(),
        "ingest complete"
    );

    let bar = ProgressBar::new(inputs.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);
    let abort = AtomicBool::new(false);
    let outcome = process_plates(
        &ctx,
        &inputs,
        &|progress: Progress| {
            bar.set_position(progress.completed as u64);
            bar.set_message(progress.status);
        },
        &abort,
    );
    bar.finish_and_clear();
    info!(
        succeeded = outcome.succeeded(),
        failed = outcome.failures.len(),
        "reduction complete"
    );

    let failures = outcome
        .failures
        .iter()
        .map(|failure| {
            format!(
                "plate {}: {}",
                inputs[failure.unit].raw.plate_id, failure.message
            )
        })
        .collect();
    let report = ReduceReport {
        assay_type: format!("{:?}", ctx.assay_type),
        plates: outcome
            .results
            .into_iter()
            .flatten()
            .map(PlateReport::from)
            .collect(),
        failures,
    };

    if !args.dry_run {
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| run_folder.join("output"));
        write_report(&output_dir, "reduction.json", &report)?;
    }
    Ok(report)
}

pub fn run_thermal(args: &ThermalArgs) -> Result<ThermalReport> {
    let frame = read_csv_frame(&args.data_file)?;
    let capillaries = frame
        .column(&args.capillary_column)
        .with_context(|| format!("column '{}' not found", args.capillary_column))?;
    let samples = frame
        .column(&args.sample_column)
        .with_context(|| format!("column '{}' not found", args.sample_column))?;
    let groups = frame
        .column(&args.group_column)
        .with_context(|| format!("column '{}' not found", args.group_column))?;
    let references = frame
        .column(&args.reference_column)
        .with_context(|| format!("column '{}' not found", args.reference_column))?;
    let temperatures = frame
        .column(&args.temperature_column)
        .with_context(|| format!("column '{}' not found", args.temperature_column))?;
    let values = frame
        .column(&args.value_column)
        .with_context(|| format!("column '{}' not found", args.value_column))?;

    let mut inputs: BTreeMap<usize, CapillaryInput> = BTreeMap::new();
    for row in 0..frame.height() {
        let Some(number) = any_to_f64(capillaries.get(row)?) else {
            bail!("row {}: capillary number is missing", row + 2);
        };
        if number < 1.0 {
            bail!("row {}: capillary number must be one-based", row + 2);
        }
        let well_index = number as usize - 1;
        // Missing temperature or signal points are dropped, not zeroed.
        let (Some(temperature), Some(value)) = (
            any_to_f64(temperatures.get(row)?),
            any_to_f64(values.get(row)?),
        ) else {
            continue;
        };
        if !inputs.contains_key(&well_index) {
            let sample_id = any_to_string_non_empty(samples.get(row)?)
                .unwrap_or_else(|| format!("C{}", well_index + 1));
            let purification_id = any_to_string_non_empty(groups.get(row)?);
            let is_reference = parse_flag(&any_to_string(references.get(row)?));
            inputs.insert(
                well_index,
                CapillaryInput {
                    well_index,
                    sample_id,
                    purification_id,
                    is_reference,
                    series: Vec::new(),
                },
            );
        }
        if let Some(input) = inputs.get_mut(&well_index) {
            input.series.push((temperature, value));
        }
    }
    if inputs.is_empty() {
        return Err(EngineError::NoDataFiles.into());
    }

    let mut inputs: Vec<CapillaryInput> = inputs.into_values().collect();
    for input in &mut inputs {
        input.series.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    info!(capillary_count = inputs.len(), "thermal ingest complete");

    let result = analyze_plate(&args.plate_id, &inputs);
    let report = ThermalReport {
        plate_id: args.plate_id.clone(),
        samples: result.samples,
        reference_tm: result.reference_tm,
        warnings: result.warnings.iter().map(ToString::to_string).collect(),
    };

    if !args.dry_run {
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&args.data_file));
        write_report(&output_dir, "thermal.json", &report)?;
    }
    Ok(report)
}

pub fn run_screen(args: &ScreenArgs) -> Result<ScreenReport> {
    let manifest = read_csv_frame(&args.manifest)?;
    let base_dir = args
        .manifest
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let format = args.plate_format.to_plate_format();

    let plate_ids = manifest
        .column("Plate ID")
        .context("manifest column 'Plate ID' not found")?;
    let files = manifest
        .column("File")
        .context("manifest column 'File' not found")?;
    let concentrations = manifest
        .column("Concentration")
        .context("manifest column 'Concentration' not found")?;
    let conditions = manifest
        .column("Condition")
        .context("manifest column 'Condition' not found")?;
    let replicates = manifest
        .column("Replicate")
        .context("manifest column 'Replicate' not found")?;
    let flags = manifest
        .column("Flags")
        .context("manifest column 'Flags' not found")?;
    let solvent = manifest
        .column("Solvent Wells")
        .context("manifest column 'Solvent Wells' not found")?;

    let mut plates = Vec::with_capacity(manifest.height());
    for row in 0..manifest.height() {
        let Some(plate_id) = any_to_string_non_empty(plate_ids.get(row)?) else {
            bail!("manifest row {}: plate id is missing", row + 2);
        };
        let Some(file) = any_to_string_non_empty(files.get(row)?) else {
            bail!("manifest row {}: file is missing", row + 2);
        };
        let Some(concentration) = any_to_f64(concentrations.get(row)?) else {
            bail!("manifest row {}: concentration is missing", row + 2);
        };
        let Some(condition_name) = any_to_string_non_empty(conditions.get(row)?) else {
            bail!("manifest row {}: condition is missing", row + 2);
        };
        let Some(replicate) = any_to_f64(replicates.get(row)?) else {
            bail!("manifest row {}: replicate is missing", row + 2);
        };
        let condition_flags = parse_condition_flags(&any_to_string(flags.get(row)?))
            .with_context(|| format!("manifest row {}", row + 2))?;
        let solvent_wells = parse_well_list(&any_to_string(solvent.get(row)?), format)
            .with_context(|| format!("manifest row {}", row + 2))?;

        let path = resolve_path(&base_dir, &file);
        let table = read_raw_csv(&path, &plate_id, format, &args.well_column, &args.value_column)?;
        let readings = (0..format.wells()).map(|index| table.scalar(index)).collect();

        plates.push(ScreenPlate {
            plate_id,
            concentration,
            condition: assay_model::Condition::new(condition_name, condition_flags),
            replicate: replicate as u32,
            format,
            readings,
            solvent_wells,
        });
    }
    info!(plate_count = plates.len(), "screen ingest complete");

    let result = aggregate(&plates)?;
    let report = ScreenReport {
        cells: result.cells,
        summaries: result.summaries,
        reference_condition: result.reference_condition,
        warnings: result.warnings.iter().map(ToString::to_string).collect(),
    };

    if !args.dry_run {
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&args.manifest));
        write_report(&output_dir, "screen.json", &report)?;
    }
    Ok(report)
}

fn discover_raw_files(folder: &Path, transfer_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(folder)
        .with_context(|| format!("read run folder {}", folder.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path != transfer_path {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("read {}", path.display()))?;
    Ok(frame)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("plate")
        .to_string()
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .map_or_else(|| PathBuf::from("output"), |dir| dir.join("output"))
}

fn resolve_path(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn write_report<T: serde::Serialize>(output_dir: &Path, name: &str, report: &T) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;
    let path = output_dir.join(name);
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

/// Parses `name=0;other=1` style condition flag lists.
fn parse_condition_flags(value: &str) -> Result<BTreeMap<String, bool>> {
    let mut flags = BTreeMap::new();
    for part in value.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((name, state)) = part.split_once('=') else {
            bail!("malformed condition flag '{part}'");
        };
        flags.insert(name.trim().to_string(), parse_flag(state));
    }
    Ok(flags)
}

/// Parses `A4;B4;C4` style well lists into linear indices.
fn parse_well_list(value: &str, format: PlateFormat) -> Result<BTreeSet<usize>> {
    let mut wells = BTreeSet::new();
    for part in value.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some(index) = format.index_of(part) else {
            bail!("well '{part}' does not exist on the plate format");
        };
        wells.insert(index);
    }
    Ok(wells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_transfer_report_names_the_file() {
        let dir = std::env::temp_dir().join("assay-reduce-no-transfer");
        fs::create_dir_all(&dir).unwrap();
        let args = crate::cli::ReduceArgs {
            run_folder: dir,
            transfer: None,
            assay_type: crate::cli::AssayTypeArg::Htrf,
            plate_format: crate::cli::PlateFormatArg::W384,
            well_column: "Well".to_string(),
            value_column: "Signal".to_string(),
            output_dir: None,
            dry_run: true,
        };
        let message = format!("{:#}", run_reduce(&args).unwrap_err());
        assert!(message.contains("transfer.csv"));
        assert!(message.contains("no layout data"));
    }

    #[test]
    fn flag_parsing_is_lenient() {
        assert!(parse_flag("1"));
        assert!(parse_flag("Yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn condition_flags_round_trip() {
        let flags = parse_condition_flags("serum=0; drugx=1").unwrap();
        assert_eq!(flags.get("serum"), Some(&false));
        assert_eq!(flags.get("drugx"), Some(&true));
        assert!(parse_condition_flags("serum").is_err());
    }

    #[test]
    fn well_lists_map_to_indices() {
        let wells = parse_well_list("A4;B4", PlateFormat::W96).unwrap();
        assert_eq!(wells, BTreeSet::from([3, 15]));
        assert!(parse_well_list("Z99", PlateFormat::W96).is_err());
    }
}
