//! Per-plate screen normalization: two-pass row/column medians and the
//! percent-of-solvent channel.

use std::collections::BTreeSet;

use tracing::warn;

use assay_core::{mean, median};
use assay_model::{Condition, EngineError, EngineWarning, PlateFormat};

/// One physical plate of the screen: a fixed solvent-reference well set
/// plus the general sample population.
#[derive(Debug, Clone)]
pub struct ScreenPlate {
    pub plate_id: String,
    pub concentration: f64,
    pub condition: Condition,
    /// 1-based replicate number.
    pub replicate: u32,
    pub format: PlateFormat,
    /// Raw reading per linear well index; `None` is missing.
    pub readings: Vec<Option<f64>>,
    pub solvent_wells: BTreeSet<usize>,
}

impl ScreenPlate {
    /// True when the well holds a sample (present reading, not solvent).
    pub fn is_sample_well(&self, index: usize) -> bool {
        !self.solvent_wells.contains(&index)
            && self.readings.get(index).is_some_and(Option::is_some)
    }
}

/// The two normalization channels of one plate.
#[derive(Debug, Clone)]
pub struct NormalizedPlate {
    /// Column-then-row median-normalized reading per well.
    pub two_pass: Vec<Option<f64>>,
    /// Raw reading as percent of the solvent-reference mean; independent
    /// of the two-pass channel.
    pub percent_of_solvent: Vec<Option<f64>>,
    /// The solvent readings that fed the percent channel.
    pub solvent_readings: Vec<f64>,
    pub warnings: Vec<EngineWarning>,
}

/// Normalize one plate.
///
/// Pass one divides every well by the median raw reading of its own
/// column among sample wells; pass two divides the column-normalized
/// value by the median of its own row among column-normalized sample
/// wells. Solvent wells never contribute to a median but are divided by
/// the same divisors. The medians are computed once up front: the
/// transform is one-shot, not iterative.
pub fn normalize_plate(plate: &ScreenPlate) -> Result<NormalizedPlate, EngineError> {
    let wells = plate.format.wells();
    if plate.readings.len() != wells {
        return Err(EngineError::RawDataFormat {
            plate: plate.plate_id.clone(),
            reason: format!(
                "expected {wells} readings for {:?}, found {}",
                plate.format,
                plate.readings.len()
            ),
        });
    }
    let columns = plate.format.columns();
    let rows = plate.format.rows();
    let mut warnings = Vec::new();

    // Pass one: column medians over sample wells only.
    let mut column_normalized: Vec<Option<f64>> = vec![None; wells];
    for column in 0..columns {
        let sample_values: Vec<f64> = (0..rows)
            .map(|row| row * columns + column)
            .filter(|&index| plate.is_sample_well(index))
            .filter_map(|index| plate.readings[index])
            .collect();
        let divisor = median(&sample_values).filter(|m| *m != 0.0);
        for row in 0..rows {
            let index = row * columns + column;
            column_normalized[index] = match (plate.readings[index], divisor) {
                (Some(value), Some(divisor)) => Some(value / divisor),
                _ => None,
            };
        }
    }

    // Pass two: row medians over the column-normalized sample wells.
    let mut two_pass: Vec<Option<f64>> = vec![None; wells];
    for row in 0..rows {
        let sample_values: Vec<f64> = (0..columns)
            .map(|column| row * columns + column)
            .filter(|&index| plate.is_sample_well(index))
            .filter_map(|index| column_normalized[index])
            .collect();
        let divisor = median(&sample_values).filter(|m| *m != 0.0);
        for column in 0..columns {
            let index = row * columns + column;
            two_pass[index] = match (column_normalized[index], divisor) {
                (Some(value), Some(divisor)) => Some(value / divisor),
                _ => None,
            };
        }
    }

    // Independent percent-of-solvent channel.
    let solvent_readings: Vec<f64> = plate
        .solvent_wells
        .iter()
        .filter_map(|&index| plate.readings.get(index).copied().flatten())
        .collect();
    let solvent_mean = mean(&solvent_readings).filter(|m| *m != 0.0);
    if solvent_mean.is_none() {
        warn!(plate = %plate.plate_id, "no usable solvent reference; percent channel undefined");
        warnings.push(EngineWarning::NoReference {
            plate: plate.plate_id.clone(),
            class: "Solvent".to_string(),
        });
    }
    let percent_of_solvent = plate
        .readings
        .iter()
        .map(|reading| match (reading, solvent_mean) {
            (Some(value), Some(solvent)) => Some(value / solvent * 100.0),
            _ => None,
        })
        .collect();

    Ok(NormalizedPlate {
        two_pass,
        percent_of_solvent,
        solvent_readings,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn condition() -> Condition {
        let mut flags = BTreeMap::new();
        flags.insert("serum".to_string(), false);
        Condition::new("base", flags)
    }

    /// A 96-well plate with the first two rows populated.
    fn plate(values: &[(usize, f64)], solvent: &[usize]) -> ScreenPlate {
        let mut readings = vec![None; 96];
        for &(index, value) in values {
            readings[index] = Some(value);
        }
        ScreenPlate {
            plate_id: "SP1".to_string(),
            concentration: 1.0,
            condition: condition(),
            replicate: 1,
            format: PlateFormat::W96,
            readings,
            solvent_wells: solvent.iter().copied().collect(),
        }
    }

    #[test]
    fn wrong_well_count_is_a_raw_data_error() {
        let mut bad = plate(&[], &[]);
        bad.readings.pop();
        assert!(matches!(
            normalize_plate(&bad).unwrap_err(),
            EngineError::RawDataFormat { .. }
        ));
    }

    #[test]
    fn column_then_row_median_normalization() {
        // Columns 0..2 of rows 0..2 (indices 0,1,2 and 12,13,14).
        let values = [
            (0, 10.0),
            (1, 20.0),
            (2, 30.0),
            (12, 20.0),
            (13, 40.0),
            (14, 60.0),
        ];
        let normalized = normalize_plate(&plate(&values, &[])).unwrap();
        // Column medians: 15, 30, 45. Column-normalized row 0 becomes
        // [2/3, 2/3, 2/3], row 1 [4/3, 4/3, 4/3]; row medians then bring
        // every populated well to exactly 1.
        for index in [0, 1, 2, 12, 13, 14] {
            let value = normalized.two_pass[index].unwrap();
            assert!((value - 1.0).abs() < 1e-12, "well {index}: {value}");
        }
    }

    #[test]
    fn normalization_is_one_shot_not_iterative() {
        // Re-running the transform on its own output changes values when
        // the medians are recomputed from the normalized population:
        // the transform is order-dependent, not idempotent.
        let values = [
            (0, 10.0),
            (1, 25.0),
            (2, 30.0),
            (12, 20.0),
            (13, 40.0),
            (14, 55.0),
            (24, 35.0),
            (25, 15.0),
            (26, 45.0),
        ];
        let input = plate(&values, &[]);
        let first = normalize_plate(&input).unwrap();

        let mut rerun = input.clone();
        rerun.readings = first.two_pass.clone();
        let second = normalize_plate(&rerun).unwrap();
        // Second-pass divisors are recomputed medians of an already
        // normalized population, so they sit near 1 and the output stays
        // close to, but is a distinct transform of, the first pass.
        let moved = (0..96).any(|i| match (first.two_pass[i], second.two_pass[i]) {
            (Some(a), Some(b)) => (a - b).abs() > 1e-12,
            _ => false,
        });
        assert!(moved);
    }

    #[test]
    fn solvent_wells_do_not_shape_the_medians() {
        // Identical sample wells; a wild solvent value must not move the
        // divisors, and the solvent well is still normalized through them.
        let values = [(0, 10.0), (1, 10.0), (12, 10.0), (13, 1000.0)];
        let normalized = normalize_plate(&plate(&values, &[13])).unwrap();
        assert_eq!(normalized.two_pass[0], Some(1.0));
        assert_eq!(normalized.two_pass[13], Some(100.0));
    }

    #[test]
    fn percent_of_solvent_is_a_plain_ratio() {
        let values = [(0, 50.0), (1, 200.0), (2, 100.0)];
        let normalized = normalize_plate(&plate(&values, &[2])).unwrap();
        assert_eq!(normalized.percent_of_solvent[0], Some(50.0));
        assert_eq!(normalized.percent_of_solvent[1], Some(200.0));
        assert_eq!(normalized.solvent_readings, vec![100.0]);
    }

    #[test]
    fn missing_solvent_leaves_percent_undefined() {
        let values = [(0, 50.0)];
        let normalized = normalize_plate(&plate(&values, &[])).unwrap();
        assert!(normalized.percent_of_solvent.iter().all(Option::is_none));
        assert_eq!(normalized.warnings.len(), 1);
    }
}
