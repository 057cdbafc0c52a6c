//! CLI argument definitions for the assay reduction engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use assay_model::{AssayType, PlateFormat};

#[derive(Parser)]
#[command(
    name = "assay-reduce",
    version,
    about = "Assay data reduction - normalize plate readings and detect melting shifts",
    long_about = "Reduce raw plate-reader exports against a liquid-handler transfer report.\n\n\
                  Supports dose-response reduction with fit gating, thermal-shift (DSF)\n\
                  melting-temperature detection, and multi-condition screen aggregation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reduce a dose-response run: classify, normalize, gate.
    Reduce(ReduceArgs),

    /// Detect melting temperatures and delta-Tm from thermal-shift series.
    Thermal(ThermalArgs),

    /// Aggregate a multi-condition screen across replicate plates.
    Screen(ScreenArgs),
}

#[derive(Parser)]
pub struct ReduceArgs {
    /// Folder holding the transfer report and one raw CSV per plate.
    #[arg(value_name = "RUN_FOLDER")]
    pub run_folder: PathBuf,

    /// Transfer report path (default: <RUN_FOLDER>/transfer.csv).
    #[arg(long = "transfer", value_name = "PATH")]
    pub transfer: Option<PathBuf>,

    /// Assay technology, selects the normalization formula.
    #[arg(long = "assay-type", value_enum, default_value = "htrf")]
    pub assay_type: AssayTypeArg,

    /// Destination plate format.
    #[arg(long = "plate-format", value_enum, default_value = "384")]
    pub plate_format: PlateFormatArg,

    /// Name of the well column in the raw CSVs.
    #[arg(long = "well-column", default_value = "Well")]
    pub well_column: String,

    /// Name of the value column in the raw CSVs.
    #[arg(long = "value-column", default_value = "Signal")]
    pub value_column: String,

    /// Output directory for the JSON report (default: <RUN_FOLDER>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Reduce and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ThermalArgs {
    /// Long-format CSV with one row per capillary and temperature point.
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// Plate identifier used in warnings and the report.
    #[arg(long = "plate-id", default_value = "TP1")]
    pub plate_id: String,

    /// Capillary number column (one-based).
    #[arg(long = "capillary-column", default_value = "Capillary")]
    pub capillary_column: String,

    /// Sample identifier column.
    #[arg(long = "sample-column", default_value = "Sample ID")]
    pub sample_column: String,

    /// Protein purification group column.
    #[arg(long = "group-column", default_value = "Purification ID")]
    pub group_column: String,

    /// Reference-capillary flag column.
    #[arg(long = "reference-column", default_value = "Reference")]
    pub reference_column: String,

    /// Temperature column.
    #[arg(long = "temperature-column", default_value = "Temperature")]
    pub temperature_column: String,

    /// Fluorescence/ratio value column.
    #[arg(long = "value-column", default_value = "Fluorescence")]
    pub value_column: String,

    /// Output directory for the JSON report (default: next to DATA_FILE).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Analyze and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ScreenArgs {
    /// Manifest CSV describing every plate of the screen.
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Plate format shared by every screen plate.
    #[arg(long = "plate-format", value_enum, default_value = "384")]
    pub plate_format: PlateFormatArg,

    /// Name of the well column in the raw CSVs.
    #[arg(long = "well-column", default_value = "Well")]
    pub well_column: String,

    /// Name of the value column in the raw CSVs.
    #[arg(long = "value-column", default_value = "Signal")]
    pub value_column: String,

    /// Output directory for the JSON report (default: next to MANIFEST).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Aggregate and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI assay type choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum AssayTypeArg {
    Htrf,
    AlphaScreen,
    Glo,
    Polarization,
}

impl AssayTypeArg {
    pub fn to_assay_type(self) -> AssayType {
        match self {
            Self::Htrf => AssayType::Htrf,
            Self::AlphaScreen => AssayType::AlphaScreen,
            Self::Glo => AssayType::Glo,
            Self::Polarization => AssayType::Polarization,
        }
    }
}

/// CLI plate format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum PlateFormatArg {
    #[value(name = "96")]
    W96,
    #[value(name = "384")]
    W384,
    #[value(name = "1536")]
    W1536,
}

impl PlateFormatArg {
    pub fn to_plate_format(self) -> PlateFormat {
        match self {
            Self::W96 => PlateFormat::W96,
            Self::W384 => PlateFormat::W384,
            Self::W1536 => PlateFormat::W1536,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
