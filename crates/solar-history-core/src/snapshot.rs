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

//! Reading charge controller export files into [`RawSnapshot`]s.

use crate::error::{HistoryError, Result};
use crate::series::RawSnapshot;
use crate::table::read_table;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_DATE_COLUMN: &str = "Date";

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_owned()
}

fn default_date_formats() -> Vec<String> {
    ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%d.%m.%Y", "%m/%d/%Y"]
        .iter()
        .map(|f| (*f).to_owned())
        .collect()
}

fn default_delimiter() -> char {
    ','
}

/// How export files are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Header of the column holding the calendar day
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// chrono formats tried in order; datetime formats are truncated to the day
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// Single-byte field delimiter of the export files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            date_column: default_date_column(),
            date_formats: default_date_formats(),
            delimiter: default_delimiter(),
        }
    }
}

impl CsvOptions {
    pub fn validate(&self) -> Result<()> {
        if self.date_column.trim().is_empty() {
            return Err(HistoryError::Config("date_column must not be empty".to_owned()));
        }
        if self.date_formats.is_empty() {
            return Err(HistoryError::Config(
                "date_formats must contain at least one format".to_owned(),
            ));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    pub(crate) fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                HistoryError::Config(format!(
                    "delimiter '{}' is not a single ASCII character",
                    self.delimiter
                ))
            })
    }
}

/// Turns export files of one device into snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    device_id: String,
    options: CsvOptions,
}

impl SnapshotReader {
    pub fn new(device_id: impl Into<String>, options: CsvOptions) -> Self {
        Self {
            device_id: device_id.into(),
            options,
        }
    }

    pub fn read_path(&self, path: &Path) -> Result<RawSnapshot> {
        let file = File::open(path).map_err(|e| HistoryError::io(path, e))?;
        let snapshot = self.read(BufReader::new(file), &path.display().to_string())?;
        debug!(
            "Read {} rows from {} ({:?})",
            snapshot.rows.len(),
            path.display(),
            snapshot.date_range()
        );
        Ok(snapshot)
    }

    /// Read one export. Every row must carry a parseable date; the rest of
    /// the columns pass through verbatim.
    pub fn read<R: Read>(&self, reader: R, source_name: &str) -> Result<RawSnapshot> {
        let table = read_table(
            reader,
            self.options.delimiter_byte()?,
            &self.options.date_column,
            &self.options.date_formats,
            source_name,
        )?;

        let mut snapshot = RawSnapshot::new(self.device_id.clone()).with_source(source_name);
        snapshot.columns = table.columns;
        snapshot.rows = table.rows;
        Ok(snapshot)
    }
}
