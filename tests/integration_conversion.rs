//! Integration tests for file-to-file conversion
//!
//! These tests run the full pipeline against files on disk to verify header
//! location, conversion, error reporting and that failed runs never leave a
//! partial output file.

use pm25_aqi::{
    AqiError, AqiProcessor, ConversionConfig, HeaderPolicy, RowErrorPolicy, ValueColumn,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Export layout as produced by a low-cost sensor dashboard
const SENSOR_EXPORT: &str = "\
# Air quality export
# Sensor: PMS5003 (balcony)
# Units: ug/m3, median of hourly readings
date,count,min,max,median,q1,q3,stdev
2024-03-07T00:00:00Z,24,3.1,19.8,10.0,6.2,12.4,3.9
2024-03-08T00:00:00Z,24,20.0,61.3,40.0,33.0,47.1,8.2
2024-03-09T00:00:00Z,24,0.0,2.0,0.0,0.0,1.0,0.5
2024-03-10T00:00:00Z,23,400.0,720.0,600.0,550.0,650.0,60.1
";

fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("unformatted.csv");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_convert_sensor_export() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, SENSOR_EXPORT);
    let output = dir.path().join("formatted.csv");

    let stats = AqiProcessor::new(ConversionConfig::default())
        .convert_file(&input, &output)
        .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "date,pm25\n2024/3/7,42\n2024/3/8,112\n2024/3/9,0\n2024/3/10,500\n"
    );
    assert_eq!(stats.header_line, 4);
    assert_eq!(stats.metadata_lines, 3);
    assert_eq!(stats.rows_written, 4);
    assert_eq!(stats.max_aqi, Some(500));
    assert_eq!(stats.preview.len(), 5);
    assert!(!written.contains('#'));
}

#[test]
fn test_reference_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "date,median\n2024-03-07T00:00:00Z,10.0\n2024-12-31T23:59:59Z,40.0\n",
    );
    let output = dir.path().join("formatted.csv");

    AqiProcessor::default()
        .convert_file(&input, &output)
        .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines, vec!["date,pm25", "2024/3/7,42", "2024/12/31,112"]);
}

#[test]
fn test_aqi_header_option() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, SENSOR_EXPORT);
    let output = dir.path().join("formatted.csv");

    AqiProcessor::new(ConversionConfig::default().with_value_column(ValueColumn::Aqi))
        .convert_file(&input, &output)
        .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("date,aqi\n"));
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("does-not-exist.csv");
    let output = dir.path().join("formatted.csv");

    let result = AqiProcessor::default().convert_file(&input, &output);

    match result {
        Err(AqiError::InputNotFound { path }) => assert_eq!(path, input),
        other => panic!("expected InputNotFound, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_directory_as_input_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("formatted.csv");

    let result = AqiProcessor::default().convert_file(dir.path(), &output);

    assert!(matches!(result, Err(AqiError::InputUnreadable { .. })));
}

#[test]
fn test_missing_header_names_the_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "# no table in this export\n");
    let output = dir.path().join("formatted.csv");

    let result = AqiProcessor::default().convert_file(&input, &output);

    match result {
        Err(AqiError::HeaderNotFound { path }) => assert_eq!(path, input),
        other => panic!("expected HeaderNotFound, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_fallback_header_policy() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "median,date\n35.4,2024-07-04\n");
    let output = dir.path().join("formatted.csv");

    let config = ConversionConfig::default().with_header_policy(HeaderPolicy::FallbackToStart);
    AqiProcessor::new(config)
        .convert_file(&input, &output)
        .unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "date,pm25\n2024/7/4,100\n"
    );
}

#[test]
fn test_row_errors_leave_no_partial_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "# export\ndate,median\n2024-01-01,5.0\n2024-01-02,abc\n2024-01-03,5.0\n",
    );
    let output = dir.path().join("formatted.csv");

    let result = AqiProcessor::default().convert_file(&input, &output);

    match result {
        Err(AqiError::RowParse { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].line, 4);
        }
        other => panic!("expected RowParse, got {:?}", other),
    }
    assert!(!output.exists());

    // only the input remains, no stray temporary files
    let entries = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn test_failed_run_keeps_previous_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "date,median\n2024-01-01,not-a-number\n");
    let output = dir.path().join("formatted.csv");
    fs::write(&output, "date,pm25\n2023/1/1,10\n").unwrap();

    let result = AqiProcessor::default().convert_file(&input, &output);

    assert!(result.is_err());
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "date,pm25\n2023/1/1,10\n"
    );
}

#[test]
fn test_skip_policy_writes_good_rows() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "date,median\n2024-01-01,5.0\n2024-01-02,abc\n2024-01-03,12.1\n",
    );
    let output = dir.path().join("formatted.csv");

    let config = ConversionConfig::default().with_row_error_policy(RowErrorPolicy::Skip);
    let stats = AqiProcessor::new(config)
        .convert_file(&input, &output)
        .unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "date,pm25\n2024/1/1,21\n2024/1/3,51\n"
    );
    assert_eq!(stats.rows_skipped, 1);
}

#[test]
fn test_missing_output_directory() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, SENSOR_EXPORT);
    let output = dir.path().join("missing").join("formatted.csv");

    let result = AqiProcessor::default().convert_file(&input, &output);

    assert!(matches!(result, Err(AqiError::OutputWrite { .. })));
}

#[test]
fn test_refuses_to_overwrite_input() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, SENSOR_EXPORT);

    let result = AqiProcessor::default().convert_file(&input, &input);

    assert!(matches!(result, Err(AqiError::Configuration { .. })));
    assert_eq!(fs::read_to_string(&input).unwrap(), SENSOR_EXPORT);
}
