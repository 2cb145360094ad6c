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

//! Shared CSV table reading: one date column, everything else opaque.

use crate::error::{HistoryError, Result};
use crate::field::FieldValue;
use crate::series::Row;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Read;

pub(crate) struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parse a date cell with the first matching format. Datetime formats are
/// accepted and truncated to the calendar day.
pub(crate) fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim().trim_end_matches('.');
    if raw.is_empty() {
        return None;
    }
    formats.iter().find_map(|format| {
        NaiveDate::parse_from_str(raw, format)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, format)
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}

pub(crate) fn read_table<R: Read>(
    reader: R,
    delimiter: u8,
    date_column: &str,
    date_formats: &[String],
    source_name: &str,
) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h.trim() == date_column)
        .ok_or_else(|| HistoryError::MissingDateColumn {
            source_name: source_name.to_owned(),
            column: date_column.to_owned(),
        })?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != date_idx)
        .map(|(_, name)| name.to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date, date_formats).ok_or_else(|| HistoryError::InvalidDate {
            source_name: source_name.to_owned(),
            line: record.position().map_or(0, csv::Position::line),
            value: raw_date.to_owned(),
        })?;

        let mut row = Row::new(date);
        for (idx, (name, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if idx == date_idx {
                continue;
            }
            if let Some(value) = FieldValue::parse(cell) {
                row.fields.insert(name.to_owned(), value);
            }
        }
        rows.push(row);
    }

    Ok(Table { columns, rows })
}
