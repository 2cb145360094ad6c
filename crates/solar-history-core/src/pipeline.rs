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

//! Load → read exports → merge → save, for one device or a whole config.

use crate::config::HistoryConfig;
use crate::error::Result;
use crate::merger::{MergeReport, SeriesMerger};
use crate::series::CanonicalSeries;
use crate::snapshot::{CsvOptions, SnapshotReader};
use crate::store::SeriesStore;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Everything needed to update one device's merged history.
#[derive(Debug, Clone)]
pub struct DeviceJob {
    pub device_id: String,
    pub snapshots: Vec<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DeviceOutcome {
    pub device_id: String,
    pub output: PathBuf,
    pub report: MergeReport,
    pub series: CanonicalSeries,
}

impl DeviceJob {
    /// Run the job. The previous merged file is only replaced once every
    /// export has been read and merged.
    pub fn run(&self, options: &CsvOptions) -> Result<DeviceOutcome> {
        let store =
            SeriesStore::new(&self.output, &self.device_id).with_date_column(&options.date_column);
        let existing = store.load()?;

        if self.snapshots.is_empty() {
            warn!("No exports given for {}, rewriting existing history", self.device_id);
        }

        let reader = SnapshotReader::new(&self.device_id, options.clone());
        let snapshots = self
            .snapshots
            .iter()
            .map(|path| reader.read_path(path))
            .collect::<Result<Vec<_>>>()?;

        let merger = SeriesMerger::new(&self.device_id);
        let (series, report) = merger.merge_with_report(existing, &snapshots)?;
        store.save(&series)?;

        Ok(DeviceOutcome {
            device_id: self.device_id.clone(),
            output: self.output.clone(),
            report,
            series,
        })
    }
}

/// Result of one device in a batch run.
#[derive(Debug)]
pub struct BatchEntry {
    pub device_id: String,
    pub result: Result<DeviceOutcome>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Jobs for every configured device, optionally restricted to `only`.
pub fn jobs_from_config(config: &HistoryConfig, only: &[String]) -> Vec<DeviceJob> {
    config
        .devices
        .iter()
        .filter(|d| only.is_empty() || only.contains(&d.id))
        .map(|d| DeviceJob {
            device_id: d.id.clone(),
            snapshots: d.snapshots.clone(),
            output: d.output_path(&config.output_dir),
        })
        .collect()
}

/// Run every job. Devices are independent: one failing does not stop the rest.
pub fn run_batch(jobs: &[DeviceJob], options: &CsvOptions) -> Vec<BatchEntry> {
    jobs.iter()
        .map(|job| {
            info!(
                "Updating history for {} from {} export(s)",
                job.device_id,
                job.snapshots.len()
            );
            let result = job.run(options);
            if let Err(e) = &result {
                error!("Failed to update history for {}: {e}", job.device_id);
            }
            BatchEntry {
                device_id: job.device_id.clone(),
                result,
            }
        })
        .collect()
}

/// Load a merged series for read-only consumers (reports, plotting).
pub fn load_merged(path: &Path, device_id: &str, date_column: &str) -> Result<Option<CanonicalSeries>> {
    SeriesStore::new(path, device_id)
        .with_date_column(date_column)
        .load()
}
