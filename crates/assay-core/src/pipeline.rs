//! Per-plate dose-response reduction: classify, summarize, normalize,
//! gate.

use anyhow::Result;
use tracing::warn;

use assay_model::{
    AssayRunContext, ConcentrationPoint, EngineWarning, Layout, ProcessedSample,
    ReferenceLocations, ResolvedSample, TransferEntry, WellTable,
};

use crate::classify::{ClassifiedPlate, classify_plate};
use crate::fitgate::should_fit;
use crate::normalize::normalize;
use crate::reference_stats::{ZPrime, summarize_references, z_prime};
use crate::resolver::resolve_samples;
use crate::stats::{mean, round2, sem, stdev};

/// Everything needed to reduce one plate.
#[derive(Debug, Clone)]
pub struct PlateInput {
    pub raw: WellTable,
    /// Transfer rows targeting this plate.
    pub entries: Vec<TransferEntry>,
}

/// The reduced plate, ready for reporting and plotting.
#[derive(Debug, Clone)]
pub struct PlateResult {
    pub plate_id: String,
    pub layout: Layout,
    pub references: ReferenceLocations,
    pub z_prime: ZPrime,
    pub samples: Vec<ProcessedSample>,
    pub warnings: Vec<EngineWarning>,
}

/// Reduce a single plate. Per-plate failures (malformed transfers) are
/// returned as errors and handled at the batch boundary.
pub fn process_plate(ctx: &AssayRunContext, input: &PlateInput) -> Result<PlateResult> {
    let plate_id = input.raw.plate_id.clone();
    let ClassifiedPlate {
        layout,
        mut references,
        mut warnings,
    } = classify_plate(ctx, &input.entries, &input.raw);
    summarize_references(&mut references, &input.raw);
    let z_prime = z_prime(&references);

    let resolved = resolve_samples(&input.entries, ctx.plate_format)?;
    let samples = resolved
        .iter()
        .filter(|sample| sample.destination_plate == plate_id)
        .map(|sample| process_sample(ctx, sample, &input.raw, &references, &mut warnings))
        .collect();

    Ok(PlateResult {
        plate_id,
        layout,
        references,
        z_prime,
        samples,
        warnings,
    })
}

/// Build the processed row for one sample: per-concentration raw
/// statistics, normalized replicate series, and the fit decision.
///
/// A normalization failure marks the sample not-fit-attempted; the row
/// stays in the output with its raw statistics intact.
fn process_sample(
    ctx: &AssayRunContext,
    sample: &ResolvedSample,
    raw: &WellTable,
    references: &ReferenceLocations,
    warnings: &mut Vec<EngineWarning>,
) -> ProcessedSample {
    let mut points = Vec::with_capacity(sample.concentrations.len());
    let mut normalization_failed = false;

    for (concentration, wells) in sample.concentrations.iter().zip(&sample.locations) {
        let raw_values: Vec<f64> = wells.iter().filter_map(|&index| raw.scalar(index)).collect();
        let normalized_values = if normalization_failed {
            None
        } else {
            match normalize(&raw_values, ctx.assay_type, references) {
                Ok(values) => Some(values),
                Err(error) => {
                    warn!(
                        plate = %sample.destination_plate,
                        sample = %sample.sample_id,
                        %error,
                        "normalization failed; sample marked not-fit-attempted"
                    );
                    normalization_failed = true;
                    None
                }
            }
        };
        points.push(ConcentrationPoint {
            concentration: *concentration,
            mean: mean(&raw_values),
            sem: sem(&raw_values),
            stdev: stdev(&raw_values),
            normalized: normalized_values
                .as_deref()
                .and_then(mean)
                .map(round2),
            normalized_sem: normalized_values.as_deref().and_then(sem),
            raw: raw_values,
            excluded: false,
        });
    }

    if normalization_failed {
        warnings.push(EngineWarning::NormalizationFailed {
            plate: sample.destination_plate.clone(),
            sample: sample.sample_id.clone(),
        });
    }

    let mut processed = ProcessedSample {
        destination_plate: sample.destination_plate.clone(),
        sample_id: sample.sample_id.clone(),
        sample_name: sample.sample_name.clone(),
        points,
        do_fit: false,
        fit: None,
    };
    processed.do_fit = !normalization_failed
        && should_fit(&processed.normalized_series(), &processed.sem_series());
    processed
}
