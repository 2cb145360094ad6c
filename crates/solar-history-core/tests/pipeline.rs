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

//! End-to-end runs over export files on disk.

use chrono::NaiveDate;
use solar_history_core::{
    CsvOptions, DeviceJob, FieldValue, HistoryConfig, HistoryError, jobs_from_config, load_merged,
    run_batch,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const HEADER: &str = "Date,Days ago,Yield(Wh),Max. PV power(W),Last error";

/// Export as the controller writes it: newest day first, "Days ago"
/// relative to the export date.
fn write_export(
    dir: &Path,
    name: &str,
    export_day: u32,
    days: std::ops::RangeInclusive<u32>,
    yield_base: i64,
) -> PathBuf {
    let mut content = String::from(HEADER);
    content.push('\n');
    for d in days.rev() {
        content.push_str(&format!(
            "2021-06-{d:02},{},{},{},No error\n",
            export_day - d,
            yield_base + i64::from(d),
            90 + d
        ));
    }
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn june(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, d).unwrap()
}

#[test]
fn test_incremental_runs() {
    init_tracing();
    let dir = tempdir().unwrap();
    let output = dir.path().join("merged").join("merged_history_mppt-1.csv");
    let options = CsvOptions::default();

    let first_export = write_export(dir.path(), "2021-06-10-mppt-1.csv", 10, 1..=10, 0);
    let job = DeviceJob {
        device_id: "mppt-1".to_owned(),
        snapshots: vec![first_export],
        output: output.clone(),
    };
    let outcome = job.run(&options).unwrap();
    assert_eq!(outcome.series.len(), 10);
    assert_eq!(outcome.report.new_dates, 10);

    // A later export overlapping days 5..=10 with corrected values
    let second_export = write_export(dir.path(), "2021-06-15-mppt-1.csv", 15, 5..=15, 1000);
    let job = DeviceJob {
        device_id: "mppt-1".to_owned(),
        snapshots: vec![second_export],
        output: output.clone(),
    };
    let outcome = job.run(&options).unwrap();
    assert_eq!(outcome.series.len(), 15);
    assert_eq!(outcome.report.new_dates, 5);
    assert_eq!(outcome.report.conflicts.len(), 6);

    let merged = load_merged(&output, "mppt-1", "Date").unwrap().unwrap();
    assert_eq!(merged, outcome.series);
    assert_eq!(
        merged.get(june(4)).unwrap().get("Yield(Wh)"),
        Some(&FieldValue::Integer(4))
    );
    assert_eq!(
        merged.get(june(7)).unwrap().get("Yield(Wh)"),
        Some(&FieldValue::Integer(1007))
    );
    assert_eq!(merged.columns()[0], "Days ago");

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("Date,Days ago,Yield(Wh),Max. PV power(W),Last error\n2021-06-01,"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("merged.csv");
    let options = CsvOptions::default();
    let job = DeviceJob {
        device_id: "mppt-2".to_owned(),
        snapshots: vec![
            write_export(dir.path(), "a.csv", 10, 1..=10, 0),
            write_export(dir.path(), "b.csv", 12, 3..=12, 50),
        ],
        output: output.clone(),
    };

    job.run(&options).unwrap();
    let first = fs::read(&output).unwrap();
    job.run(&options).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_bad_export_keeps_previous_history() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("merged.csv");
    let options = CsvOptions::default();

    DeviceJob {
        device_id: "mppt-1".to_owned(),
        snapshots: vec![write_export(dir.path(), "good.csv", 5, 1..=5, 0)],
        output: output.clone(),
    }
    .run(&options)
    .unwrap();
    let before = fs::read(&output).unwrap();

    let bad = dir.path().join("bad.csv");
    fs::write(&bad, format!("{HEADER}\nnot-a-date,0,1,2,No error\n")).unwrap();
    let err = DeviceJob {
        device_id: "mppt-1".to_owned(),
        snapshots: vec![bad],
        output: output.clone(),
    }
    .run(&options)
    .unwrap_err();

    assert!(matches!(err, HistoryError::InvalidDate { line: 2, .. }));
    assert_eq!(fs::read(&output).unwrap(), before);
}

#[test]
fn test_batch_continues_after_failed_device() {
    let dir = tempdir().unwrap();
    write_export(dir.path(), "mppt-2-export.csv", 3, 1..=3, 0);

    let config_path = dir.path().join("solar-history.toml");
    fs::write(
        &config_path,
        r#"
output_dir = "out"

[[devices]]
id = "mppt-1"
snapshots = ["missing-export.csv"]

[[devices]]
id = "mppt-2"
snapshots = ["mppt-2-export.csv"]
"#,
    )
    .unwrap();

    let config = HistoryConfig::from_file(&config_path).unwrap();
    let jobs = jobs_from_config(&config, &[]);
    let results = run_batch(&jobs, &config.csv);

    assert_eq!(results.len(), 2);
    assert!(!results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(dir.path().join("out/merged_history_mppt-2.csv").exists());
    assert!(!dir.path().join("out/merged_history_mppt-1.csv").exists());

    let only = jobs_from_config(&config, &["mppt-2".to_owned()]);
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].device_id, "mppt-2");
}
