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

//! Daily rows, raw export snapshots and the canonical per-device series.

use crate::field::FieldValue;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Column name → value. Absent keys are empty cells.
pub type Fields = BTreeMap<String, FieldValue>;

/// One calendar day of measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: NaiveDate,
    pub fields: Fields,
}

impl Row {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fields: Fields::new(),
        }
    }

    /// Builder-style field setter, mostly for fixtures. The value is stored
    /// in its persisted form; empty text clears the field.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        match value.into().normalize() {
            Some(value) => {
                self.fields.insert(column.to_owned(), value);
            }
            None => {
                self.fields.remove(column);
            }
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    fn normalize_fields(&mut self) {
        self.fields = std::mem::take(&mut self.fields)
            .into_iter()
            .filter_map(|(name, value)| value.normalize().map(|v| (name, v)))
            .collect();
    }
}

/// One exported file for one device, covering a rolling window of days.
///
/// Rows keep file order; nothing here assumes they are sorted or unique.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    pub device_id: String,
    /// Where the snapshot came from (usually the file path), for log output
    pub source: Option<String>,
    /// Header order, date column excluded
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RawSnapshot {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            source: None,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Append a row, registering any column not seen before.
    pub fn push_row(&mut self, mut row: Row) {
        row.normalize_fields();
        for name in row.fields.keys() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.clone());
            }
        }
        self.rows.push(row);
    }

    #[must_use]
    pub fn with_row(mut self, row: Row) -> Self {
        self.push_row(row);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn label(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.device_id)
    }

    /// Earliest and latest date covered, in any row order.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(|r| r.date).min()?;
        let last = self.rows.iter().map(|r| r.date).max()?;
        Some((first, last))
    }
}

/// The merged, authoritative time series of one device.
///
/// Dates are unique and strictly increasing. Fields are private so the
/// only ways to obtain a series are the merger, the store, or
/// [`CanonicalSeries::from_rows`], all of which enforce that.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSeries {
    device_id: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl CanonicalSeries {
    pub fn empty(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build a series from rows that are already sorted and unique.
    ///
    /// Field values are stored in their persisted form (see
    /// [`FieldValue::normalize`]). Returns the reason when the rows break
    /// the ordering invariant.
    pub fn from_rows(
        device_id: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Row>,
    ) -> std::result::Result<Self, String> {
        check_strictly_increasing(&rows)?;
        Ok(Self::from_rows_unchecked(device_id.into(), columns, rows))
    }

    pub(crate) fn from_rows_unchecked(
        device_id: String,
        mut columns: Vec<String>,
        mut rows: Vec<Row>,
    ) -> Self {
        for row in &mut rows {
            row.normalize_fields();
            for name in row.fields.keys() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.clone());
                }
            }
        }
        Self {
            device_id,
            columns,
            rows,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Row> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Rows whose date falls inside `[from, to]`.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> &[Row] {
        let start = self.rows.partition_point(|r| r.date < from);
        let end = self.rows.partition_point(|r| r.date <= to);
        if start >= end {
            return &[];
        }
        &self.rows[start..end]
    }

    /// Rows of one calendar month.
    pub fn month(&self, year: i32, month: u32) -> &[Row] {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return &[];
        };
        let last = last_day_of_month(first);
        self.range(first, last)
    }

    /// Runs of missing days between the first and last recorded date.
    pub fn gaps(&self) -> Vec<DateGap> {
        self.rows
            .windows(2)
            .filter_map(|pair| {
                let next_expected = pair[0].date.succ_opt()?;
                if pair[1].date > next_expected {
                    Some(DateGap {
                        first_missing: next_expected,
                        last_missing: pair[1].date.pred_opt()?,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Per-month coverage over the span of the series, optionally summing
    /// one numeric column (e.g. the daily yield).
    pub fn monthly_summary(&self, sum_column: Option<&str>) -> Vec<MonthSummary> {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return Vec::new();
        };

        let mut summaries: Vec<MonthSummary> = Vec::new();
        let mut rows = self.rows.iter().peekable();

        for day in first.iter_days().take_while(|d| *d <= last) {
            let needs_new = summaries
                .last()
                .is_none_or(|s| s.year != day.year() || s.month != day.month());
            if needs_new {
                summaries.push(MonthSummary {
                    year: day.year(),
                    month: day.month(),
                    days_expected: 0,
                    days_present: 0,
                    total: sum_column.map(|_| 0.0),
                });
            }
            let Some(summary) = summaries.last_mut() else {
                continue;
            };
            summary.days_expected += 1;

            if let Some(row) = rows.next_if(|r| r.date == day) {
                summary.days_present += 1;
                if let (Some(column), Some(total)) = (sum_column, summary.total.as_mut())
                    && let Some(value) = row.get(column).and_then(FieldValue::as_f64)
                {
                    *total += value;
                }
            }
        }

        summaries
    }
}

/// A contiguous run of calendar days with no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateGap {
    pub first_missing: NaiveDate,
    pub last_missing: NaiveDate,
}

impl DateGap {
    pub fn days(&self) -> i64 {
        (self.last_missing - self.first_missing).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    /// Days of this month inside the series span
    pub days_expected: u32,
    pub days_present: u32,
    pub total: Option<f64>,
}

impl MonthSummary {
    pub fn days_missing(&self) -> u32 {
        self.days_expected - self.days_present
    }
}

pub(crate) fn check_strictly_increasing(rows: &[Row]) -> std::result::Result<(), String> {
    for pair in rows.windows(2) {
        if pair[1].date == pair[0].date {
            return Err(format!("duplicate date {}", pair[1].date));
        }
        if pair[1].date < pair[0].date {
            return Err(format!(
                "date {} follows {} (not ascending)",
                pair[1].date, pair[0].date
            ));
        }
    }
    Ok(())
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    fn series(days: &[u32]) -> CanonicalSeries {
        let rows = days
            .iter()
            .map(|d| Row::new(day(*d)).with("Yield(Wh)", i64::from(*d) * 10))
            .collect();
        CanonicalSeries::from_rows("mppt-1", vec![], rows).unwrap()
    }

    #[test]
    fn test_from_rows_rejects_duplicates() {
        let rows = vec![Row::new(day(1)), Row::new(day(1))];
        let err = CanonicalSeries::from_rows("mppt-1", vec![], rows).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_from_rows_rejects_descending() {
        let rows = vec![Row::new(day(2)), Row::new(day(1))];
        assert!(CanonicalSeries::from_rows("mppt-1", vec![], rows).is_err());
    }

    #[test]
    fn test_with_stores_persisted_form() {
        let row = Row::new(day(1))
            .with("Code", "42")
            .with("Serial", "007")
            .with("Note", "kept")
            .with("Note", "");
        assert_eq!(row.get("Code"), Some(&FieldValue::Integer(42)));
        assert_eq!(row.get("Serial"), Some(&FieldValue::Text("007".to_owned())));
        assert!(row.get("Note").is_none());
    }

    #[test]
    fn test_from_rows_normalizes_fields() {
        let mut row = Row::new(day(1));
        row.fields
            .insert("Code".to_owned(), FieldValue::Text("42".to_owned()));
        row.fields.insert("Note".to_owned(), FieldValue::Text(String::new()));

        let s = CanonicalSeries::from_rows("mppt-1", vec![], vec![row]).unwrap();
        assert_eq!(s.rows()[0].get("Code"), Some(&FieldValue::Integer(42)));
        assert!(s.rows()[0].get("Note").is_none());
        assert_eq!(s.columns(), ["Code".to_owned()]);
    }

    #[test]
    fn test_from_rows_collects_columns() {
        let s = series(&[1, 2]);
        assert_eq!(s.columns(), ["Yield(Wh)".to_owned()]);
    }

    #[test]
    fn test_get_and_range() {
        let s = series(&[1, 3, 5, 7]);
        assert_eq!(
            s.get(day(3)).unwrap().get("Yield(Wh)"),
            Some(&FieldValue::Integer(30))
        );
        assert!(s.get(day(4)).is_none());

        let dates: Vec<_> = s.range(day(2), day(5)).iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(3), day(5)]);
        assert!(s.range(day(8), day(9)).is_empty());
    }

    #[test]
    fn test_gaps() {
        let s = series(&[1, 2, 5, 6, 8]);
        let gaps = s.gaps();
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].first_missing, day(3));
        assert_eq!(gaps[0].last_missing, day(4));
        assert_eq!(gaps[0].days(), 2);
        assert_eq!(gaps[1].first_missing, day(7));
        assert_eq!(gaps[1].days(), 1);
    }

    #[test]
    fn test_no_gaps_in_contiguous_series() {
        assert!(series(&[1, 2, 3]).gaps().is_empty());
        assert!(CanonicalSeries::empty("mppt-1").gaps().is_empty());
    }

    #[test]
    fn test_month_slice() {
        let rows = vec![
            Row::new(NaiveDate::from_ymd_opt(2021, 4, 30).unwrap()),
            Row::new(day(1)),
            Row::new(day(31)),
            Row::new(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()),
        ];
        let s = CanonicalSeries::from_rows("mppt-1", vec![], rows).unwrap();
        assert_eq!(s.month(2021, 5).len(), 2);
        assert_eq!(s.month(2021, 12).len(), 0);
        assert_eq!(s.month(2021, 13).len(), 0);
    }

    #[test]
    fn test_monthly_summary_spans_month_boundary() {
        let rows = vec![
            Row::new(NaiveDate::from_ymd_opt(2021, 4, 29).unwrap()).with("Yield(Wh)", 100_i64),
            Row::new(NaiveDate::from_ymd_opt(2021, 4, 30).unwrap()).with("Yield(Wh)", 50.5),
            Row::new(day(2)).with("Yield(Wh)", "n/a"),
            Row::new(day(3)).with("Yield(Wh)", 20_i64),
        ];
        let s = CanonicalSeries::from_rows("mppt-1", vec![], rows).unwrap();
        let summary = s.monthly_summary(Some("Yield(Wh)"));

        assert_eq!(summary.len(), 2);
        assert_eq!((summary[0].year, summary[0].month), (2021, 4));
        assert_eq!(summary[0].days_expected, 2);
        assert_eq!(summary[0].days_present, 2);
        assert_eq!(summary[0].total, Some(150.5));

        assert_eq!(summary[1].month, 5);
        assert_eq!(summary[1].days_expected, 3);
        assert_eq!(summary[1].days_present, 2);
        assert_eq!(summary[1].days_missing(), 1);
        assert_eq!(summary[1].total, Some(20.0));
    }

    #[test]
    fn test_monthly_summary_without_column() {
        let summary = series(&[1, 2]).monthly_summary(None);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total, None);
    }

    #[test]
    fn test_snapshot_registers_columns_in_order() {
        let snapshot = RawSnapshot::new("mppt-1")
            .with_row(Row::new(day(2)).with("b", 1_i64).with("a", 2_i64))
            .with_row(Row::new(day(1)).with("c", 3_i64));
        // BTreeMap iteration order within a row, first-seen across rows
        assert_eq!(snapshot.columns, vec!["a", "b", "c"]);
        assert_eq!(snapshot.date_range(), Some((day(1), day(2))));
        assert_eq!(snapshot.label(), "mppt-1");
    }
}
