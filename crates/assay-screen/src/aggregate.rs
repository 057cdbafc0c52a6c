//! Cross-plate aggregation: replicate averaging, Z and delta-Z scoring,
//! per-well screen summary.

use tracing::{info, warn};

use assay_core::{linear_regression, mean, stdev};
use assay_model::{
    CellStatus, Condition, ConditionCell, EngineError, EngineWarning, ScreenWellSummary,
};

use crate::normalize::{NormalizedPlate, ScreenPlate, normalize_plate};

/// Concentrations within this relative tolerance belong to the same cell.
const CONCENTRATION_EPSILON: f64 = 1e-9;

fn same_concentration(a: f64, b: f64) -> bool {
    (a - b).abs() <= CONCENTRATION_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Whole-screen output.
#[derive(Debug, Clone)]
pub struct ScreenResult {
    pub cells: Vec<ConditionCell>,
    /// Per-well most negative delta-Z across every cell.
    pub summaries: Vec<ScreenWellSummary>,
    /// The detected all-negative reference condition, when one exists.
    pub reference_condition: Option<Condition>,
    pub warnings: Vec<EngineWarning>,
}

struct PlateGroup<'a> {
    concentration: f64,
    condition: &'a Condition,
    members: Vec<(&'a ScreenPlate, NormalizedPlate)>,
}

/// Aggregate every plate of a screen.
///
/// Plates sharing (concentration, condition) are replicates of one cell.
/// Fails only on structural problems (wrong well count, inconsistent
/// plate formats); missing references and empty cells degrade to
/// warnings and undefined values.
pub fn aggregate(plates: &[ScreenPlate]) -> Result<ScreenResult, EngineError> {
    let Some(first) = plates.first() else {
        return Err(EngineError::NoDataFiles);
    };
    let format = first.format;
    let wells = format.wells();
    let mut warnings = Vec::new();

    // Normalize each plate independently, then group into cells.
    let mut groups: Vec<PlateGroup<'_>> = Vec::new();
    for plate in plates {
        if plate.format != format {
            return Err(EngineError::RawDataFormat {
                plate: plate.plate_id.clone(),
                reason: format!(
                    "plate format {:?} does not match the screen's {:?}",
                    plate.format, format
                ),
            });
        }
        let normalized = normalize_plate(plate)?;
        warnings.extend(normalized.warnings.iter().cloned());
        match groups.iter_mut().find(|group| {
            same_concentration(group.concentration, plate.concentration)
                && *group.condition == plate.condition
        }) {
            Some(group) => group.members.push((plate, normalized)),
            None => groups.push(PlateGroup {
                concentration: plate.concentration,
                condition: &plate.condition,
                members: vec![(plate, normalized)],
            }),
        }
    }

    let reference_condition = detect_reference_condition(plates);
    if reference_condition.is_none() {
        warn!("no all-negative reference condition; delta-Z undefined for the whole screen");
    }

    let mut cells: Vec<ConditionCell> = groups
        .iter()
        .map(|group| build_cell(group, wells))
        .collect();

    // Delta-Z against the same well under the reference condition at the
    // same concentration.
    if let Some(reference) = &reference_condition {
        let reference_z: Vec<(f64, Vec<Option<f64>>)> = cells
            .iter()
            .filter(|cell| &cell.condition == reference)
            .map(|cell| (cell.concentration, cell.z_scores.clone()))
            .collect();
        for cell in &mut cells {
            let Some((_, reference_scores)) = reference_z
                .iter()
                .find(|(concentration, _)| same_concentration(*concentration, cell.concentration))
            else {
                continue;
            };
            for index in 0..wells {
                cell.delta_z_scores[index] =
                    match (cell.z_scores[index], reference_scores[index]) {
                        (Some(z), Some(reference_z)) => Some(z - reference_z),
                        _ => None,
                    };
            }
        }
    }

    let summaries = (0..wells)
        .map(|well_index| ScreenWellSummary {
            well_index,
            min_delta_z: cells
                .iter()
                .filter_map(|cell| cell.delta_z_scores[well_index])
                .min_by(f64::total_cmp),
        })
        .collect();

    info!(
        cells = cells.len(),
        plates = plates.len(),
        "screen aggregation complete"
    );
    Ok(ScreenResult {
        cells,
        summaries,
        reference_condition,
        warnings,
    })
}

/// One (concentration, condition) cell from its replicate plates.
fn build_cell(group: &PlateGroup<'_>, wells: usize) -> ConditionCell {
    // Replicate-average the two-pass-normalized values; a well is skipped
    // only when every replicate is missing.
    let mut data: Vec<Option<f64>> = Vec::with_capacity(wells);
    let mut percent: Vec<Option<f64>> = Vec::with_capacity(wells);
    for index in 0..wells {
        let replicate_values: Vec<f64> = group
            .members
            .iter()
            .filter_map(|(_, normalized)| normalized.two_pass[index])
            .collect();
        data.push(mean(&replicate_values));
        let percent_values: Vec<f64> = group
            .members
            .iter()
            .filter_map(|(_, normalized)| normalized.percent_of_solvent[index])
            .collect();
        percent.push(mean(&percent_values));
    }

    let controls = group
        .members
        .iter()
        .flat_map(|(_, normalized)| normalized.solvent_readings.iter().copied())
        .collect();

    // Replicate-pair regression over percent-of-solvent, replicate 1 vs 2.
    let regression = replicate_regression(group, wells);

    // Z-scores over this cell's sample population only.
    let sample_values: Vec<f64> = (0..wells)
        .filter(|&index| group.members.iter().any(|(plate, _)| plate.is_sample_well(index)))
        .filter_map(|index| data[index])
        .collect();
    let population_mean = mean(&sample_values);
    let population_stdev = stdev(&sample_values).filter(|sd| *sd != 0.0);
    let z_scores: Vec<Option<f64>> = data
        .iter()
        .map(|value| match (value, population_mean, population_stdev) {
            (Some(value), Some(mean), Some(stdev)) => Some((value - mean) / stdev),
            // Zero spread is an explicit undefined, never a NaN.
            _ => None,
        })
        .collect();

    let status = if data.iter().all(Option::is_none) {
        CellStatus::SkippedNoData
    } else {
        CellStatus::Computed
    };

    ConditionCell {
        concentration: group.concentration,
        condition: group.condition.clone(),
        status,
        data,
        percent_of_solvent: percent,
        controls,
        regression,
        z_scores,
        delta_z_scores: vec![None; wells],
    }
}

fn replicate_regression(
    group: &PlateGroup<'_>,
    wells: usize,
) -> Option<assay_model::ReplicateRegression> {
    let first = group
        .members
        .iter()
        .find(|(plate, _)| plate.replicate == 1)?;
    let second = group
        .members
        .iter()
        .find(|(plate, _)| plate.replicate == 2)?;
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for index in 0..wells {
        if let (Some(x), Some(y)) = (
            first.1.percent_of_solvent[index],
            second.1.percent_of_solvent[index],
        ) {
            xs.push(x);
            ys.push(y);
        }
    }
    linear_regression(&xs, &ys)
}

/// The designated reference condition: the unique all-negative flag
/// combination, when the screen has one.
fn detect_reference_condition(plates: &[ScreenPlate]) -> Option<Condition> {
    plates
        .iter()
        .map(|plate| &plate.condition)
        .find(|condition| condition.is_all_negative())
        .cloned()
}
