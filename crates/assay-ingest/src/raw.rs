//! Structural checks on raw-reader tables.
//!
//! Instrument collaborators hand over a long-format DataFrame with one
//! row per well: a well-name column and a value column. This module
//! verifies the columns exist and the well names address the declared
//! plate format, then converts into the engine's `WellTable`. Wells the
//! table never mentions stay `Missing`.

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};

use assay_model::{PlateFormat, Reading, WellTable};

use crate::error::{IngestError, Result};
use crate::polars_utils::{any_to_f64, any_to_string};

/// Converts a long-format raw table into a `WellTable`.
pub fn well_table_from_frame(
    plate_id: &str,
    format: PlateFormat,
    frame: &DataFrame,
    well_column: &str,
    value_column: &str,
) -> Result<WellTable> {
    let wells = frame
        .column(well_column)
        .map_err(|_| IngestError::RawColumnNotFound {
            column: well_column.to_string(),
            plate: plate_id.to_string(),
        })?;
    let values = frame
        .column(value_column)
        .map_err(|_| IngestError::RawColumnNotFound {
            column: value_column.to_string(),
            plate: plate_id.to_string(),
        })?;

    let mut table = WellTable::new(plate_id, format);
    for row in 0..frame.height() {
        let well_name = any_to_string(wells.get(row)?);
        if well_name.trim().is_empty() {
            continue;
        }
        let index = format
            .index_of(&well_name)
            .ok_or_else(|| IngestError::UnknownWell {
                well: well_name.clone(),
                plate: plate_id.to_string(),
            })?;
        match any_to_f64(values.get(row)?) {
            Some(value) => table.set_reading(index, Reading::Scalar(value)),
            None => table.set_reading(index, Reading::Missing),
        }
    }
    Ok(table)
}

/// Reads a raw CSV export into a `WellTable`.
pub fn read_raw_csv(
    path: &Path,
    plate_id: &str,
    format: PlateFormat,
    well_column: &str,
    value_column: &str,
) -> Result<WellTable> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    well_table_from_frame(plate_id, format, &frame, well_column, value_column)
}
