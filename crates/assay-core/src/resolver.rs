//! Transfer resolution: transfer records to a per-plate sample table.

use std::collections::BTreeMap;

use assay_model::{EngineError, PlateFormat, ResolvedSample, TransferEntry};

/// Relative tolerance for treating two destination concentrations as the
/// same replicate group; liquid-handler reports round inconsistently.
const CONCENTRATION_EPSILON: f64 = 1e-9;

fn same_concentration(a: f64, b: f64) -> bool {
    (a - b).abs() <= CONCENTRATION_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Resolve ordered transfer records into one row per unique non-control
/// sample id per destination plate.
///
/// Rows with a null transfer volume or a null destination concentration
/// are discarded; rows named "Control" belong to the classifier, not the
/// sample table. Replicate wells at the same concentration merge into a
/// single group whose location list grows, via a stable group-by rather
/// than in-place found-flag mutation. Output is sorted by (plate, sample
/// id) with concentrations descending within each row.
pub fn resolve_samples(
    entries: &[TransferEntry],
    format: PlateFormat,
) -> Result<Vec<ResolvedSample>, EngineError> {
    // (plate, sample id) -> (sample name, ordered concentration groups)
    let mut grouped: BTreeMap<(String, String), (String, Vec<(f64, Vec<usize>)>)> = BTreeMap::new();

    for entry in entries {
        if entry.transfer_volume.is_none() || entry.is_control() {
            continue;
        }
        let Some(sample_id) = entry.sample_id.as_ref() else {
            continue;
        };
        let Some(concentration) = entry.destination_concentration else {
            continue;
        };
        let well = format
            .index_of(&entry.destination_well)
            .ok_or_else(|| EngineError::TransferFormat {
                reason: format!(
                    "well {} on plate {} is not a valid {:?} coordinate",
                    entry.destination_well, entry.destination_plate, format
                ),
            })?;
        let key = (entry.destination_plate.clone(), sample_id.clone());
        let slot = grouped
            .entry(key)
            .or_insert_with(|| (entry.sample_name.clone(), Vec::new()));
        match slot
            .1
            .iter_mut()
            .find(|(existing, _)| same_concentration(*existing, concentration))
        {
            Some((_, wells)) => wells.push(well),
            None => slot.1.push((concentration, vec![well])),
        }
    }

    let samples = grouped
        .into_iter()
        .map(|((plate, sample_id), (sample_name, mut groups))| {
            groups.sort_by(|a, b| b.0.total_cmp(&a.0));
            let (concentrations, locations) = groups.into_iter().unzip();
            ResolvedSample {
                destination_plate: plate,
                sample_id,
                sample_name,
                concentrations,
                locations,
            }
        })
        .collect();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(plate: &str, well: &str, id: Option<&str>, name: &str, conc: f64) -> TransferEntry {
        TransferEntry {
            destination_plate: plate.to_string(),
            destination_well: well.to_string(),
            sample_id: id.map(str::to_string),
            sample_name: name.to_string(),
            source_concentration: Some(conc * 100.0),
            destination_concentration: Some(conc),
            transfer_volume: Some(25.0),
        }
    }

    #[test]
    fn merges_duplicate_concentrations() {
        let entries = vec![
            entry("DP1", "A1", Some("CPD1"), "Compound 1", 10.0),
            entry("DP1", "A2", Some("CPD1"), "Compound 1", 10.0),
            entry("DP1", "A3", Some("CPD1"), "Compound 1", 1.0),
        ];
        let samples = resolve_samples(&entries, PlateFormat::W384).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].concentrations, vec![10.0, 1.0]);
        assert_eq!(samples[0].locations, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn excludes_control_and_null_volume_rows() {
        let mut control = entry("DP1", "B1", Some("CTL"), "Control", 10.0);
        control.sample_name = "Control".to_string();
        let mut no_volume = entry("DP1", "B2", Some("CPD2"), "Compound 2", 10.0);
        no_volume.transfer_volume = None;
        let samples =
            resolve_samples(&[control, no_volume], PlateFormat::W384).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn sorts_concentrations_descending() {
        let entries = vec![
            entry("DP1", "C1", Some("CPD3"), "Compound 3", 0.1),
            entry("DP1", "C2", Some("CPD3"), "Compound 3", 10.0),
            entry("DP1", "C3", Some("CPD3"), "Compound 3", 1.0),
        ];
        let samples = resolve_samples(&entries, PlateFormat::W384).unwrap();
        assert_eq!(samples[0].concentrations, vec![10.0, 1.0, 0.1]);
    }

    #[test]
    fn invalid_well_is_a_transfer_format_error() {
        let entries = vec![entry("DP1", "Z99", Some("CPD4"), "Compound 4", 1.0)];
        let err = resolve_samples(&entries, PlateFormat::W96).unwrap_err();
        assert!(matches!(err, EngineError::TransferFormat { .. }));
    }
}
