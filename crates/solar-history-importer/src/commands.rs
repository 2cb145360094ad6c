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

//! Subcommand implementations.

use crate::args::{InspectArgs, MergeArgs, RunArgs};
use crate::formatters::{format_batch, format_gaps, format_monthly, format_overview, format_rows};
use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use solar_history_core::config::default_output_name;
use solar_history_core::{DeviceJob, HistoryConfig, jobs_from_config, load_merged, run_batch};
use std::path::{Path, PathBuf};
use tracing::info;

/// Whether every device was updated.
pub type AllSucceeded = bool;

pub fn merge(args: &MergeArgs) -> Result<AllSucceeded> {
    let options = args.csv.to_options();
    options.validate().context("Invalid CSV options")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_name(&args.device)));

    let job = DeviceJob {
        device_id: args.device.clone(),
        snapshots: args.snapshots.clone(),
        output,
    };
    let results = run_batch(std::slice::from_ref(&job), &options);
    println!("{}", format_batch(&results));

    Ok(results.iter().all(|r| r.is_ok()))
}

pub fn run(args: &RunArgs) -> Result<AllSucceeded> {
    info!("Loading config: {}", args.config.display());
    let config = HistoryConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    for wanted in &args.devices {
        if config.device(wanted).is_none() {
            bail!(
                "Device '{wanted}' is not configured in {}",
                args.config.display()
            );
        }
    }

    let jobs = jobs_from_config(&config, &args.devices);
    let results = run_batch(&jobs, &config.csv);
    println!("{}", format_batch(&results));

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        info!("{failed} of {} device(s) failed", results.len());
    }
    Ok(failed == 0)
}

pub fn inspect(args: &InspectArgs) -> Result<()> {
    let device = args
        .device
        .clone()
        .unwrap_or_else(|| device_from_file_name(&args.file));

    let series = load_merged(&args.file, &device, &args.date_column)
        .with_context(|| format!("Failed to read {}", args.file.display()))?
        .with_context(|| format!("{} does not exist", args.file.display()))?;

    let gaps = series.gaps();
    println!("{}", format_overview(&series, &gaps));
    if !gaps.is_empty() {
        println!("{}", format_gaps(&gaps));
    }

    let sum_column = series
        .columns()
        .iter()
        .any(|c| c == &args.sum_column)
        .then_some(args.sum_column.as_str());
    if sum_column.is_none() {
        info!("Column '{}' not present, monthly totals skipped", args.sum_column);
    }
    println!(
        "{}",
        format_monthly(&series.monthly_summary(sum_column), &args.sum_column)
    );

    if let Some(month) = &args.month {
        let (year, month) = parse_month(month)?;
        let rows = series.month(year, month);
        println!("{}", format_rows(&series, rows, &args.date_column));
    }

    Ok(())
}

/// "merged_history_mppt-1.csv" → "mppt-1"; otherwise the file stem.
fn device_from_file_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix("merged_history_")
        .map_or_else(|| stem.clone(), ToOwned::to_owned)
}

fn parse_month(value: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{value}', expected YYYY-MM"))?;
    Ok((first.year(), first.month()))
}
