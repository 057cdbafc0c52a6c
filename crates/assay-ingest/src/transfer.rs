//! Transfer report parsing.
//!
//! The liquid handler writes a sectioned text file: free-form preamble,
//! a `[DETAILS]` section holding one CSV row per physical transfer, and
//! an optional `[EXCEPTIONS]` section listing wells whose transfer did
//! not complete. Section names are case-insensitive and a section runs
//! until the next `[...]` marker or end of file.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use assay_model::{TransferEntry, WellAddress};

use crate::error::{IngestError, Result};

/// Everything the engine needs out of one transfer report.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub entries: Vec<TransferEntry>,
    /// Wells whose dispense failed. Classification demotes these to
    /// unassigned regardless of what the details rows claim.
    pub exceptions: BTreeSet<WellAddress>,
}

/// Reads and parses a transfer report from disk.
pub fn read_transfer_report(path: &Path) -> Result<TransferReport> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_transfer_report(&text)
}

/// Parses the report text. The `[DETAILS]` section is mandatory; the
/// `[EXCEPTIONS]` section is optional and may be empty.
pub fn parse_transfer_report(text: &str) -> Result<TransferReport> {
    let lines: Vec<&str> = text.lines().collect();

    let details = extract_section(&lines, "DETAILS").ok_or(IngestError::MissingDetailsSection)?;
    let entries = parse_details(&details)?;

    let exceptions = match extract_section(&lines, "EXCEPTIONS") {
        Some(section) => parse_exceptions(&section)?,
        None => BTreeSet::new(),
    };

    Ok(TransferReport {
        entries,
        exceptions,
    })
}

/// One section's CSV body, with the one-based file line each row came from.
struct Section {
    text: String,
    first_line: usize,
}

fn is_marker(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('[') && trimmed.ends_with(']')
}

fn extract_section(lines: &[&str], name: &str) -> Option<Section> {
    let start = lines.iter().position(|line| {
        let trimmed = line.trim();
        is_marker(line) && trimmed[1..trimmed.len() - 1].eq_ignore_ascii_case(name)
    })? + 1;
    let body: Vec<&str> = lines[start..]
        .iter()
        .take_while(|line| !is_marker(line))
        .copied()
        .collect();
    Some(Section {
        text: body.join("\n"),
        first_line: start + 1,
    })
}

fn parse_details(section: &Section) -> Result<Vec<TransferEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(section.text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| csv_error(err, section.first_line))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Ok(Vec::new());
    }
    let plate = required_column(&headers, "Destination Plate Name", "DETAILS")?;
    let well = required_column(&headers, "Destination Well", "DETAILS")?;
    let sample_id = required_column(&headers, "Sample ID", "DETAILS")?;
    let sample_name = required_column(&headers, "Sample Name", "DETAILS")?;
    let source_conc = required_column(&headers, "Source Concentration", "DETAILS")?;
    let dest_conc = required_column(&headers, "Destination Concentration", "DETAILS")?;
    let volume = required_column(&headers, "Transfer Volume", "DETAILS")?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_error(err, section.first_line))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record_line(&record, section.first_line);
        entries.push(TransferEntry {
            destination_plate: field(&record, plate).to_string(),
            destination_well: field(&record, well).to_string(),
            sample_id: non_empty(field(&record, sample_id)),
            sample_name: field(&record, sample_name).to_string(),
            source_concentration: optional_f64(
                field(&record, source_conc),
                "Source Concentration",
                line,
            )?,
            destination_concentration: optional_f64(
                field(&record, dest_conc),
                "Destination Concentration",
                line,
            )?,
            transfer_volume: optional_f64(field(&record, volume), "Transfer Volume", line)?,
        });
    }
    Ok(entries)
}

fn parse_exceptions(section: &Section) -> Result<BTreeSet<WellAddress>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(section.text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| csv_error(err, section.first_line))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Ok(BTreeSet::new());
    }
    let plate = required_column(&headers, "Destination Plate Name", "EXCEPTIONS")?;
    let well = required_column(&headers, "Destination Well", "EXCEPTIONS")?;

    let mut exceptions = BTreeSet::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_error(err, section.first_line))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let (Some(plate_value), Some(well_value)) = (record.get(plate), record.get(well)) else {
            return Err(IngestError::MalformedRow {
                line: record_line(&record, section.first_line),
                message: "exception row is missing plate or well".to_string(),
            });
        };
        exceptions.insert(WellAddress::new(plate_value.trim(), well_value.trim()));
    }
    Ok(exceptions)
}

fn required_column(headers: &StringRecord, name: &str, section: &str) -> Result<usize> {
    headers
        .iter()
        .position(|column| column.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
            section: section.to_string(),
        })
}

fn field<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("").trim()
}

/// Maps a record's position within the section body back to a file line.
fn record_line(record: &StringRecord, first_line: usize) -> usize {
    record
        .position()
        .map(|pos| first_line + pos.line() as usize - 1)
        .unwrap_or(first_line)
}

fn csv_error(err: csv::Error, first_line: usize) -> IngestError {
    let line = match err.position() {
        Some(pos) => first_line + pos.line() as usize - 1,
        None => first_line,
    };
    IngestError::MalformedRow {
        line,
        message: err.to_string(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_f64(value: &str, name: &str, line: usize) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| IngestError::InvalidValue {
            field: name.to_string(),
            value: value.to_string(),
            line,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Destination Plate Name,Destination Well,Sample ID,Sample Name,\
Source Concentration,Destination Concentration,Transfer Volume";

    #[test]
    fn parses_details_rows() {
        let text = format!(
            "Run Date,2026-08-12\n\n[DETAILS]\n{HEADER}\n\
             DP1,A1,CPD-1,Compound 1,10000,10,25\n\
             DP1,A2,,DMSO,,,25\n"
        );
        let report = parse_transfer_report(&text).expect("parse");
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].sample_id.as_deref(), Some("CPD-1"));
        assert_eq!(report.entries[0].destination_concentration, Some(10.0));
        assert_eq!(report.entries[1].sample_id, None);
        assert!(report.exceptions.is_empty());
    }

    #[test]
    fn missing_details_section_is_fatal() {
        let err = parse_transfer_report("Run Date,2026-08-12\n").unwrap_err();
        assert!(matches!(err, IngestError::MissingDetailsSection));
    }

    #[test]
    fn section_markers_are_case_insensitive() {
        let text = format!("[details]\n{HEADER}\nDP1,A1,CPD-1,Compound 1,10000,10,25\n");
        let report = parse_transfer_report(&text).expect("parse");
        assert_eq!(report.entries.len(), 1);
    }

    #[test]
    fn exceptions_become_well_addresses() {
        let text = format!(
            "[DETAILS]\n{HEADER}\n\
             DP1,A1,CPD-1,Compound 1,10000,10,25\n\
             [EXCEPTIONS]\nDestination Plate Name,Destination Well\nDP1,A1\n"
        );
        let report = parse_transfer_report(&text).expect("parse");
        assert_eq!(report.exceptions.len(), 1);
        assert!(report.exceptions.contains(&WellAddress::new("DP1", "A1")));
    }

    #[test]
    fn failed_transfers_keep_a_null_volume() {
        let text = format!("[DETAILS]\n{HEADER}\nDP1,A1,CPD-1,Compound 1,10000,10,\n");
        let report = parse_transfer_report(&text).expect("parse");
        assert_eq!(report.entries[0].transfer_volume, None);
    }

    #[test]
    fn quoted_sample_names_keep_their_commas() {
        let text = format!(
            "[DETAILS]\n{HEADER}\nDP1,A1,CPD-1,\"Compound 1, batch 2\",10000,10,25\n"
        );
        let report = parse_transfer_report(&text).expect("parse");
        assert_eq!(report.entries[0].sample_name, "Compound 1, batch 2");
    }

    #[test]
    fn missing_column_names_the_section() {
        let text = "[DETAILS]\nDestination Plate Name,Destination Well\nDP1,A1\n";
        let err = parse_transfer_report(text).unwrap_err();
        match err {
            IngestError::MissingColumn { column, section } => {
                assert_eq!(column, "Sample ID");
                assert_eq!(section, "DETAILS");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_concentration_is_invalid_value() {
        let text = format!("[DETAILS]\n{HEADER}\nDP1,A1,CPD-1,Compound 1,10000,high,25\n");
        let err = parse_transfer_report(&text).unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { line: 3, .. }));
    }
}
