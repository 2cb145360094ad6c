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

//! Batch configuration: which devices to merge, from which exports, into
//! which files.
//!
//! ```toml
//! output_dir = "merged"
//!
//! [csv]
//! date_column = "Date"
//!
//! [[devices]]
//! id = "mppt-1"
//! snapshots = [
//!     "solar_history/2021-05-30-mppt-1-SolarHistory.csv",
//!     "solar_history/2021-06-22-mppt-1-SolarHistory.csv",
//! ]
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use crate::error::{HistoryError, Result};
use crate::snapshot::CsvOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Where merged series go unless a device names its own output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub csv: CsvOptions,

    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Controller identifier, e.g. "mppt-1"
    pub id: String,

    /// Export files, oldest first; later files win on overlapping days
    #[serde(default)]
    pub snapshots: Vec<PathBuf>,

    /// Merged series file (default: `<output_dir>/merged_history_<id>.csv`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Default file name of a device's merged series.
pub fn default_output_name(device_id: &str) -> String {
    format!("merged_history_{device_id}.csv")
}

impl DeviceConfig {
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| output_dir.join(default_output_name(&self.id)))
    }
}

impl HistoryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HistoryError::io(path, e))?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.csv.validate()?;

        if self.devices.is_empty() {
            return Err(HistoryError::Config(
                "at least one [[devices]] entry is required".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.id.trim().is_empty() {
                return Err(HistoryError::Config("device id must not be empty".to_owned()));
            }
            if !seen.insert(device.id.as_str()) {
                return Err(HistoryError::Config(format!(
                    "device '{}' is configured more than once",
                    device.id
                )));
            }
        }

        let mut outputs = HashSet::new();
        for device in &self.devices {
            if !outputs.insert(device.output_path(&self.output_dir)) {
                return Err(HistoryError::Config(format!(
                    "device '{}' shares its output file with another device",
                    device.id
                )));
            }
        }

        Ok(())
    }

    /// Anchor relative paths at `base` instead of the process working directory.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        anchor(&mut self.output_dir);
        for device in &mut self.devices {
            device.snapshots.iter_mut().for_each(anchor);
            if let Some(output) = device.output.as_mut() {
                anchor(output);
            }
        }
    }

    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id == id)
    }
}
