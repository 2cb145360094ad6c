// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use solar_history_core::CsvOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "solar-history")]
#[command(author, version, about = "Merge charge controller history exports into one series per device")]
#[command(
    long_about = "Charge controllers export the last ~30 days of daily statistics. Repeated\n\
    exports overlap; this tool folds them into one merged CSV per controller,\n\
    one row per day, and keeps it up to date across runs. On overlapping days\n\
    the most recently supplied export wins.\n\
    \nExamples:\n  \
    solar-history merge --device mppt-1 2021-06-22-mppt-1-SolarHistory.csv\n  \
    solar-history run --config solar-history.toml\n  \
    solar-history inspect merged_history_mppt-1.csv --month 2021-06"
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge export files of one device into its history file
    Merge(MergeArgs),

    /// Merge every device listed in a TOML config file
    Run(RunArgs),

    /// Summarise a merged history file: coverage, gaps, monthly totals
    Inspect(InspectArgs),
}

/// Layout of the CSV files, shared by every subcommand that reads them.
#[derive(Args, Debug, Clone)]
pub struct CsvArgs {
    /// Header of the date column
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// chrono date format, may be repeated; defaults cover ISO, German and US dates
    #[arg(long = "date-format")]
    pub date_formats: Vec<String>,

    /// Field delimiter of the export files
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
}

impl CsvArgs {
    pub fn to_options(&self) -> CsvOptions {
        let defaults = CsvOptions::default();
        CsvOptions {
            date_column: self.date_column.clone(),
            date_formats: if self.date_formats.is_empty() {
                defaults.date_formats
            } else {
                self.date_formats.clone()
            },
            delimiter: self.delimiter,
        }
    }
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Controller identifier, e.g. mppt-1
    #[arg(short, long)]
    pub device: String,

    /// Merged history file (default: merged_history_<device>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub csv: CsvArgs,

    /// Export files, oldest first; later files win on overlapping days
    pub snapshots: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "solar-history.toml")]
    pub config: PathBuf,

    /// Only update these devices (may be repeated)
    #[arg(short, long = "device")]
    pub devices: Vec<String>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Merged history file
    pub file: PathBuf,

    /// Device name shown in the report (default: derived from the file name)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Header of the date column
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// Numeric column summed per month
    #[arg(long, default_value = "Yield(Wh)")]
    pub sum_column: String,

    /// Also print every row of this month (YYYY-MM)
    #[arg(long)]
    pub month: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_merge_args() {
        let cli = Cli::parse_from([
            "solar-history",
            "merge",
            "--device",
            "mppt-1",
            "--delimiter",
            ";",
            "a.csv",
            "b.csv",
        ]);
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge command");
        };
        assert_eq!(args.device, "mppt-1");
        assert_eq!(args.snapshots, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        let options = args.csv.to_options();
        assert_eq!(options.delimiter, ';');
        assert_eq!(options.date_formats, CsvOptions::default().date_formats);
    }

    #[test]
    fn test_explicit_date_formats_replace_defaults() {
        let cli = Cli::parse_from([
            "solar-history",
            "merge",
            "-d",
            "mppt-2",
            "--date-format",
            "%d/%m/%Y",
        ]);
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge command");
        };
        assert_eq!(args.csv.to_options().date_formats, vec!["%d/%m/%Y"]);
        assert!(args.snapshots.is_empty());
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["solar-history", "-v", "run"]);
        assert!(cli.verbose);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("solar-history.toml"));
        assert!(args.devices.is_empty());
    }
}
