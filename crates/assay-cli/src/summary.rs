//! Terminal summary tables for the three subcommands.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use assay_model::CellStatus;

use crate::types::{ReduceReport, ScreenReport, ThermalReport};

pub fn print_reduce_summary(report: &ReduceReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Plate"),
        header_cell("Samples"),
        header_cell("Fit eligible"),
        header_cell("Z'"),
        header_cell("Robust Z'"),
        header_cell("Warnings"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for plate in &report.plates {
        let fit_eligible = plate.samples.iter().filter(|s| s.do_fit).count();
        table.add_row(vec![
            Cell::new(&plate.plate_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(plate.samples.len()),
            Cell::new(fit_eligible),
            metric_cell(plate.z_prime.mean_based),
            metric_cell(plate.z_prime.robust),
            warning_cell(plate.warnings.len()),
        ]);
    }
    println!("{table}");
    print_errors(&report.failures);
}

pub fn print_thermal_summary(report: &ThermalReport) {
    println!("Plate: {}", report.plate_id);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Capillary"),
        header_cell("Sample"),
        header_cell("Group"),
        header_cell("Tm"),
        header_cell("dTm"),
        header_cell("Initial"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for sample in &report.samples {
        table.add_row(vec![
            Cell::new(sample.well_index + 1),
            Cell::new(&sample.sample_id),
            Cell::new(sample.purification_id.as_deref().unwrap_or("-")),
            metric_cell(sample.primary_tm()),
            metric_cell(sample.delta_tm),
            Cell::new(
                sample
                    .initial_fluorescence
                    .map_or_else(|| "-".to_string(), |band| format!("{band:?}")),
            ),
        ]);
    }
    println!("{table}");
    print_warnings(&report.warnings);
}

pub fn print_screen_summary(report: &ScreenReport) {
    match &report.reference_condition {
        Some(condition) => println!("Reference condition: {}", condition.name),
        None => println!("Reference condition: none detected"),
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Concentration"),
        header_cell("Condition"),
        header_cell("Status"),
        header_cell("Slope"),
        header_cell("R2"),
        header_cell("Pearson"),
    ]);
    apply_table_style(&mut table);
    for index in [0, 3, 4, 5] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for cell in &report.cells {
        let status = match cell.status {
            CellStatus::Computed => Cell::new("ok").fg(Color::Green),
            CellStatus::SkippedNoData => Cell::new("no data").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(cell.concentration),
            Cell::new(&cell.condition.name),
            status,
            metric_cell(cell.regression.map(|r| r.slope)),
            metric_cell(cell.regression.map(|r| r.r_squared)),
            metric_cell(cell.regression.map(|r| r.pearson)),
        ]);
    }
    println!("{table}");

    let hits = report
        .summaries
        .iter()
        .filter(|summary| summary.min_delta_z.is_some_and(|z| z <= -3.0))
        .count();
    println!("Wells at delta-Z <= -3: {hits}");
    print_warnings(&report.warnings);
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!("Warnings:");
    for warning in warnings {
        eprintln!("- {warning}");
    }
}

fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Errors:");
    for error in errors {
        eprintln!("- {error}");
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn metric_cell(value: Option<f64>) -> Cell {
    match value {
        Some(value) => Cell::new(format!("{value:.3}")),
        None => dim_cell("-"),
    }
}

fn warning_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Yellow).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
