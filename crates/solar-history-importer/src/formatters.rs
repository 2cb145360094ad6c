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

//! Table output for merge results and history summaries.

use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use solar_history_core::{BatchEntry, CanonicalSeries, DateGap, MonthSummary, Row};

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_owned(), |d| d.to_string())
}

/// One line per device of a merge run.
pub fn format_batch(entries: &[BatchEntry]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(&[
        "Device",
        "Days",
        "First",
        "Last",
        "New days",
        "Duplicates\ndropped",
        "Conflicts",
        "Output",
    ]));

    for entry in entries {
        match &entry.result {
            Ok(outcome) => {
                let conflicts = outcome.report.conflicts.len();
                let conflict_cell = if conflicts > 0 {
                    Cell::new(conflicts).fg(Color::Yellow)
                } else {
                    Cell::new(conflicts)
                };
                table.add_row(vec![
                    Cell::new(&entry.device_id),
                    Cell::new(outcome.series.len()),
                    Cell::new(date_or_dash(outcome.series.first_date())),
                    Cell::new(date_or_dash(outcome.series.last_date())),
                    Cell::new(outcome.report.new_dates),
                    Cell::new(outcome.report.duplicates_dropped),
                    conflict_cell,
                    Cell::new(outcome.output.display()),
                ]);
            }
            Err(e) => {
                table.add_row(vec![
                    Cell::new(&entry.device_id).fg(Color::Red),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new(format!("FAILED: {e}")).fg(Color::Red),
                ]);
            }
        }
    }

    table.to_string()
}

/// Headline numbers of a merged series.
pub fn format_overview(series: &CanonicalSeries, gaps: &[DateGap]) -> String {
    let missing: i64 = gaps.iter().map(DateGap::days).sum();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(&["Device", "Days", "First", "Last", "Gaps", "Missing days"]));
    table.add_row(vec![
        Cell::new(series.device_id()),
        Cell::new(series.len()),
        Cell::new(date_or_dash(series.first_date())),
        Cell::new(date_or_dash(series.last_date())),
        Cell::new(gaps.len()),
        Cell::new(missing),
    ]);
    table.to_string()
}

pub fn format_gaps(gaps: &[DateGap]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(&["Missing from", "Missing to", "Days"]));
    for gap in gaps {
        table.add_row(vec![
            Cell::new(gap.first_missing),
            Cell::new(gap.last_missing),
            Cell::new(gap.days()),
        ]);
    }
    table.to_string()
}

pub fn format_monthly(summaries: &[MonthSummary], sum_column: &str) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(&["Month", "Days present", "Days missing", sum_column]));

    for month in summaries {
        let missing = month.days_missing();
        let missing_cell = if missing > 0 {
            Cell::new(missing).fg(Color::Yellow)
        } else {
            Cell::new(missing)
        };
        table.add_row(vec![
            Cell::new(format!("{}-{:02}", month.year, month.month)),
            Cell::new(month.days_present),
            missing_cell,
            Cell::new(
                month
                    .total
                    .map_or_else(|| "-".to_owned(), |t| format!("{t:.1}")),
            ),
        ]);
    }
    table.to_string()
}

/// Every row of a slice of the series, columns in series order.
pub fn format_rows(series: &CanonicalSeries, rows: &[Row], date_column: &str) -> String {
    let mut columns = vec![date_column];
    columns.extend(series.columns().iter().map(String::as_str));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(&columns));
    for row in rows {
        let mut cells = vec![Cell::new(row.date)];
        cells.extend(series.columns().iter().map(|column| {
            Cell::new(
                row.get(column)
                    .map_or_else(String::new, ToString::to_string),
            )
        }));
        table.add_row(cells);
    }
    table.to_string()
}
