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

//! Merging overlapping daily exports into one canonical series.
//!
//! Controller exports cover a rolling window (typically the last 30 days),
//! so consecutive exports overlap heavily. When two inputs disagree about a
//! day, the most recently supplied one wins: snapshots override the
//! persisted series, and later snapshots override earlier ones.
//!
//! Columns keep first-seen order: those of the persisted series, then new
//! ones in the order the snapshots introduce them. Rows do not depend on
//! snapshot order when dates are disjoint, but the header can.

use crate::error::{HistoryError, Result};
use crate::series::{CanonicalSeries, RawSnapshot, Row};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info};

/// Outcome counters of a single merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Rows fed in, existing series included
    pub input_rows: usize,
    pub output_rows: usize,
    /// Rows discarded because a more authoritative row had the same date
    pub duplicates_dropped: usize,
    /// Dates where the discarded rows carried different values than the winner
    pub conflicts: Vec<NaiveDate>,
    /// Dates not present in the existing series
    pub new_dates: usize,
}

/// Merges snapshots of one device into its canonical series.
#[derive(Debug, Clone)]
pub struct SeriesMerger {
    device_id: String,
}

impl SeriesMerger {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn merge(
        &self,
        existing: Option<CanonicalSeries>,
        new_snapshots: &[RawSnapshot],
    ) -> Result<CanonicalSeries> {
        self.merge_with_report(existing, new_snapshots)
            .map(|(series, _)| series)
    }

    pub fn merge_with_report(
        &self,
        existing: Option<CanonicalSeries>,
        new_snapshots: &[RawSnapshot],
    ) -> Result<(CanonicalSeries, MergeReport)> {
        if let Some(series) = existing.as_ref() {
            self.check_device(series.device_id())?;
        }
        for snapshot in new_snapshots {
            self.check_device(&snapshot.device_id)?;
        }

        let mut columns: Vec<String> = Vec::new();
        let mut known_dates: HashSet<NaiveDate> = HashSet::new();
        let mut working: Vec<Row> = Vec::new();

        // Working set in authority order: persisted rows first, then snapshots
        // as supplied.
        if let Some(series) = existing {
            extend_columns(&mut columns, series.columns());
            known_dates.extend(series.rows().iter().map(|r| r.date));
            working.extend(series.into_rows());
        }
        for snapshot in new_snapshots {
            if snapshot.is_empty() {
                debug!(
                    "Snapshot {} of {} has no rows, skipping",
                    snapshot.label(),
                    self.device_id
                );
                continue;
            }
            extend_columns(&mut columns, &snapshot.columns);
            working.extend(snapshot.rows.iter().cloned());
        }

        let input_rows = working.len();

        // Stable sort keeps authority order among rows of the same date
        working.sort_by_key(|r| r.date);

        let mut merged: Vec<Row> = Vec::with_capacity(working.len());
        let mut conflicts: Vec<NaiveDate> = Vec::new();
        for row in working {
            if let Some(last) = merged.last_mut()
                && last.date == row.date
            {
                if last.fields != row.fields && conflicts.last() != Some(&row.date) {
                    conflicts.push(row.date);
                }
                *last = row;
                continue;
            }
            merged.push(row);
        }

        let new_dates = merged
            .iter()
            .filter(|r| !known_dates.contains(&r.date))
            .count();

        let report = MergeReport {
            input_rows,
            output_rows: merged.len(),
            duplicates_dropped: input_rows - merged.len(),
            conflicts,
            new_dates,
        };

        if !report.conflicts.is_empty() {
            debug!(
                "{}: {} date(s) had differing values, latest export kept: {:?}",
                self.device_id,
                report.conflicts.len(),
                report.conflicts
            );
        }
        info!(
            "Merged {} rows for {} into {} days ({} duplicates dropped, {} new)",
            report.input_rows,
            self.device_id,
            report.output_rows,
            report.duplicates_dropped,
            report.new_dates
        );

        let series = CanonicalSeries::from_rows_unchecked(self.device_id.clone(), columns, merged);
        Ok((series, report))
    }

    fn check_device(&self, found: &str) -> Result<()> {
        if found == self.device_id {
            Ok(())
        } else {
            Err(HistoryError::DeviceMismatch {
                expected: self.device_id.clone(),
                found: found.to_owned(),
            })
        }
    }
}

fn extend_columns(columns: &mut Vec<String>, more: &[String]) {
    for name in more {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
}
