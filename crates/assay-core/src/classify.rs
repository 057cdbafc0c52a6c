//! Reference classification: one pure pass assigning every well a role.
//!
//! Precedence is Control > Solvent > Buffer > Sample. Exceptions override
//! every rule and leave the well unassigned. Backfill wells (a solvent
//! dispense at an address also used by a real sample) are excluded from
//! the Solvent class and fall through to Sample.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use assay_model::{
    AssayRunContext, EngineWarning, Layout, ReferenceClass, ReferenceLocations, TransferEntry,
    WellRole, WellTable,
};

/// Classification output for one plate.
#[derive(Debug, Clone)]
pub struct ClassifiedPlate {
    pub layout: Layout,
    pub references: ReferenceLocations,
    pub warnings: Vec<EngineWarning>,
}

/// Classify every well of `raw`'s plate using the transfer records that
/// target it.
///
/// Writes the role into the layout's well-role array and collects the
/// per-class well sets. Only records with a non-null transfer volume
/// participate.
pub fn classify_plate(
    ctx: &AssayRunContext,
    entries: &[TransferEntry],
    raw: &WellTable,
) -> ClassifiedPlate {
    let format = ctx.plate_format;
    let plate_id = raw.plate_id.as_str();
    let mut layout = Layout::new(plate_id, format);
    let mut references = ReferenceLocations::new(plate_id);

    // Transfer rows for this plate, indexed by destination well.
    let mut targeting: BTreeMap<usize, Vec<&TransferEntry>> = BTreeMap::new();
    // Addresses used by any real (non-null id, non-control) sample; a
    // solvent dispense at one of these is a backfill.
    let mut sample_addresses: BTreeSet<usize> = BTreeSet::new();
    for entry in entries {
        if entry.destination_plate != plate_id || entry.transfer_volume.is_none() {
            continue;
        }
        let Some(index) = format.index_of(&entry.destination_well) else {
            debug!(
                plate = plate_id,
                well = %entry.destination_well,
                "transfer row targets a well outside the plate format; ignored"
            );
            continue;
        };
        targeting.entry(index).or_default().push(entry);
        if entry.has_sample() && !entry.is_control() {
            sample_addresses.insert(index);
        }
    }

    for index in 0..format.wells() {
        let well_name = format.name_of(index).unwrap_or_default();
        if ctx.is_exception(plate_id, &well_name) {
            layout.set_role(index, WellRole::Unassigned);
            continue;
        }
        let rows = targeting.get(&index).map(Vec::as_slice).unwrap_or(&[]);
        let role = if rows.iter().any(|entry| entry.is_control()) {
            WellRole::Control
        } else if !rows.is_empty() {
            let solvent_only = rows.iter().all(|entry| !entry.has_sample());
            if solvent_only && !sample_addresses.contains(&index) {
                WellRole::Solvent
            } else {
                WellRole::Sample
            }
        } else if raw.has_reading(index) {
            WellRole::Buffer
        } else {
            WellRole::Unassigned
        };
        layout.set_role(index, role);
        if let Some(entry) = rows.first() {
            layout.concentrations[index] = entry.destination_concentration;
        }

        let class = match role {
            WellRole::Control => Some(ReferenceClass::Control),
            WellRole::Solvent => Some(ReferenceClass::Solvent),
            WellRole::Buffer => Some(ReferenceClass::Buffer),
            WellRole::Sample => Some(ReferenceClass::SamplePopulation),
            WellRole::Unassigned => None,
        };
        if let Some(class) = class {
            references.wells.entry(class).or_default().push(index);
        }
    }

    let mut warnings = Vec::new();
    if !references.has_class(ReferenceClass::Control) {
        warnings.push(EngineWarning::NoReference {
            plate: plate_id.to_string(),
            class: ReferenceClass::Control.as_str().to_string(),
        });
    }
    if !references.has_class(ReferenceClass::Solvent)
        && !references.has_class(ReferenceClass::Buffer)
    {
        warnings.push(EngineWarning::NoReference {
            plate: plate_id.to_string(),
            class: ReferenceClass::Solvent.as_str().to_string(),
        });
    }

    ClassifiedPlate {
        layout,
        references,
        warnings,
    }
}
