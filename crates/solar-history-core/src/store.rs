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

//! Persistence of canonical series as CSV files.
//!
//! The persisted file has the same shape as a controller export: the date
//! column first, then every other column in first-seen order, one row per
//! day in ascending order.

use crate::error::{HistoryError, Result};
use crate::series::{CanonicalSeries, check_strictly_increasing};
use crate::snapshot::DEFAULT_DATE_COLUMN;
use crate::table::read_table;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Date format of persisted series.
pub const STORE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Write `series` as CSV. Absent fields become empty cells.
pub fn write_series<W: Write>(writer: W, series: &CanonicalSeries, date_column: &str) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(series.columns().len() + 1);
    header.push(date_column);
    header.extend(series.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in series.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.date.format(STORE_DATE_FORMAT).to_string());
        for column in series.columns() {
            record.push(row.get(column).map(ToString::to_string).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| HistoryError::io("<series writer>", e))?;
    Ok(())
}

/// Read a persisted series. Files breaking the one-row-per-day ordering
/// are rejected, not repaired.
pub fn read_series<R: Read>(
    reader: R,
    device_id: &str,
    date_column: &str,
    source_name: &str,
) -> Result<CanonicalSeries> {
    let formats = [STORE_DATE_FORMAT.to_owned()];
    let table = read_table(reader, b',', date_column, &formats, source_name)?;

    check_strictly_increasing(&table.rows).map_err(|reason| HistoryError::CorruptSeries {
        path: PathBuf::from(source_name),
        reason,
    })?;

    Ok(CanonicalSeries::from_rows_unchecked(
        device_id.to_owned(),
        table.columns,
        table.rows,
    ))
}

/// File-backed store for the canonical series of one device.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    path: PathBuf,
    device_id: String,
    date_column: String,
}

impl SeriesStore {
    pub fn new(path: impl Into<PathBuf>, device_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            device_id: device_id.into(),
            date_column: DEFAULT_DATE_COLUMN.to_owned(),
        }
    }

    #[must_use]
    pub fn with_date_column(mut self, date_column: impl Into<String>) -> Self {
        self.date_column = date_column.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted series; `None` on first run when no file exists yet.
    pub fn load(&self) -> Result<Option<CanonicalSeries>> {
        if !self.path.exists() {
            info!(
                "No merged history for {} at {}, starting fresh",
                self.device_id,
                self.path.display()
            );
            return Ok(None);
        }

        let file = File::open(&self.path).map_err(|e| HistoryError::io(&self.path, e))?;
        let series = read_series(
            BufReader::new(file),
            &self.device_id,
            &self.date_column,
            &self.path.display().to_string(),
        )?;

        info!(
            "Loaded merged history for {}: {} days ({:?} to {:?})",
            self.device_id,
            series.len(),
            series.first_date(),
            series.last_date()
        );
        Ok(Some(series))
    }

    /// Replace the persisted series.
    ///
    /// Atomic: the series is written to a temp file next to the target and
    /// renamed over it, so a failed save leaves the old file in place.
    pub fn save(&self, series: &CanonicalSeries) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| HistoryError::io(&parent, e))?;
        }

        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| HistoryError::io(&parent, e))?;
        write_series(&mut temp, series, &self.date_column)?;
        temp.as_file()
            .sync_all()
            .map_err(|e| HistoryError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| HistoryError::io(&self.path, e.error))?;

        info!(
            "Saved merged history for {} to {} ({} days)",
            self.device_id,
            self.path.display(),
            series.len()
        );
        Ok(())
    }
}
