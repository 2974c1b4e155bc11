//! Row reader for the tabular section of a sensor export
//!
//! Turns the text from the header line onwards into a lazy sequence of
//! [`InputRecord`]s. Rows that cannot be parsed surface as [`RowError`]s so
//! the caller decides whether to stop, collect or skip.

use crate::constants::columns;
use crate::error::{AqiError, Result, RowError, RowErrorKind};
use crate::models::InputRecord;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use csv::{StringRecord, StringRecordsIntoIter, Trim};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Timestamp layouts carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Timestamp layouts without an offset, read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column positions resolved from the header row
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// Column name to index mapping
    pub name_to_index: HashMap<String, usize>,

    /// Number of columns declared by the header
    pub field_count: usize,

    date_index: usize,
    median_index: usize,
}

impl ColumnMapping {
    /// Resolve required columns from the header row
    pub fn analyze(headers: &StringRecord, header_line: usize) -> Result<Self> {
        let name_to_index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_string(), index))
            .collect();

        let find = |column: &str| {
            name_to_index
                .get(column)
                .copied()
                .ok_or_else(|| AqiError::MissingColumn {
                    column: column.to_string(),
                    header_line,
                })
        };

        let [date_index, median_index] = columns::REQUIRED.map(find);
        let date_index = date_index?;
        let median_index = median_index?;

        Ok(Self {
            field_count: headers.len(),
            name_to_index,
            date_index,
            median_index,
        })
    }
}

/// Lazy iterator over the data rows of a table section
pub struct RecordReader<'a> {
    table: &'a str,
    records: StringRecordsIntoIter<&'a [u8]>,
    columns: ColumnMapping,
    header_index: usize,
}

impl<'a> RecordReader<'a> {
    /// Create a reader over `table`, whose first line is the header
    ///
    /// `header_index` is the 0-based position of that header line in the
    /// original input and is used to report absolute line numbers.
    pub fn new(table: &'a str, header_index: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(table.as_bytes());

        let headers = reader.headers()?.clone();
        let columns = ColumnMapping::analyze(&headers, header_index + 1)?;
        debug!(
            "Column mapping: {} columns, date at {}, median at {}",
            columns.field_count, columns.date_index, columns.median_index
        );

        Ok(Self {
            table,
            records: reader.into_records(),
            columns,
            header_index,
        })
    }

    pub fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    /// 1-based line number of a record in the original input
    fn absolute_line(&self, position: Option<&csv::Position>) -> usize {
        let Some(pos) = position else {
            return 0;
        };
        // positions point past the previous record, before any blank lines
        let start = (pos.byte() as usize).min(self.table.len());
        let blank_lines = self.table.as_bytes()[start..]
            .iter()
            .take_while(|&&byte| byte == b'\n' || byte == b'\r')
            .filter(|&&byte| byte == b'\n')
            .count();
        self.header_index + pos.line() as usize + blank_lines
    }

    fn parse_record(&self, record: &StringRecord) -> std::result::Result<InputRecord, RowError> {
        let line = self.absolute_line(record.position());

        if record.len() != self.columns.field_count {
            return Err(RowError::new(
                line,
                RowErrorKind::FieldCount {
                    expected: self.columns.field_count,
                    found: record.len(),
                },
            ));
        }

        let date_str = required_field(record, self.columns.date_index, columns::DATE, line)?;
        let timestamp = parse_timestamp(date_str).ok_or_else(|| {
            RowError::new(
                line,
                RowErrorKind::InvalidDate {
                    value: date_str.to_string(),
                },
            )
        })?;

        let median_str = required_field(record, self.columns.median_index, columns::MEDIAN, line)?;
        let median = parse_concentration(median_str).ok_or_else(|| {
            RowError::new(
                line,
                RowErrorKind::InvalidConcentration {
                    value: median_str.to_string(),
                },
            )
        })?;

        trace!("Line {}: {} -> {}", line, timestamp, median);

        Ok(InputRecord {
            line,
            timestamp,
            median,
        })
    }
}

impl Iterator for RecordReader<'_> {
    type Item = std::result::Result<InputRecord, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        Some(match result {
            Ok(record) => self.parse_record(&record),
            Err(error) => Err(self.malformed(&error)),
        })
    }
}

impl RecordReader<'_> {
    /// Row error for a record the csv reader itself rejected
    ///
    /// The reader is flexible over valid UTF-8, so in practice this only
    /// covers csv failures that field-level checks cannot see.
    fn malformed(&self, error: &csv::Error) -> RowError {
        RowError::new(
            self.absolute_line(error.position()),
            RowErrorKind::Malformed {
                message: error.to_string(),
            },
        )
    }
}

fn required_field<'r>(
    record: &'r StringRecord,
    index: usize,
    column: &str,
    line: usize,
) -> std::result::Result<&'r str, RowError> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RowError::new(
            line,
            RowErrorKind::EmptyField {
                column: column.to_string(),
            },
        )),
    }
}

/// Parse a PM2.5 concentration, rejecting non-finite values
pub fn parse_concentration(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|concentration| concentration.is_finite())
}

/// Parse an ISO-8601 timestamp, keeping the offset it was written with
///
/// A trailing `Z` is read as `+00:00`. Timestamps without an offset, and bare
/// dates, are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    let normalized = match trimmed.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
    {
        return Some(dt);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Some(DateTime::<FixedOffset>::from_naive_utc_and_offset(
        naive,
        Utc.fix(),
    ))
}
