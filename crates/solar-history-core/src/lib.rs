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

//! Solar History - merged daily history of charge controller exports
//!
//! Charge controllers export a rolling window of daily statistics. This crate
//! folds repeated, overlapping exports into one duplicate-free series per
//! controller and keeps it on disk across runs.

pub mod config;
pub mod error;
pub mod field;
pub mod merger;
pub mod pipeline;
pub mod series;
pub mod snapshot;
pub mod store;
mod table;

pub use config::{DeviceConfig, HistoryConfig};
pub use error::{HistoryError, Result};
pub use field::FieldValue;
pub use merger::{MergeReport, SeriesMerger};
pub use pipeline::{BatchEntry, DeviceJob, DeviceOutcome, jobs_from_config, load_merged, run_batch};
pub use series::{CanonicalSeries, DateGap, Fields, MonthSummary, RawSnapshot, Row};
pub use snapshot::{CsvOptions, SnapshotReader};
pub use store::{SeriesStore, read_series, write_series};
