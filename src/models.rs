//! Core data structures for PM2.5 to AQI conversion.
//!
//! Defines the transient input and output records and the statistics
//! returned from a conversion run.

use crate::aqi::AqiCategory;
use crate::error::RowError;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One parsed row of the sensor table
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    /// 1-based line number in the input file
    pub line: usize,

    /// Reading timestamp with the offset it was written in
    pub timestamp: DateTime<FixedOffset>,

    /// Median PM2.5 concentration (µg/m³)
    pub median: f64,
}

impl InputRecord {
    /// Calendar date of the reading as written, without timezone conversion
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// One row of the converted dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRecord {
    pub date: NaiveDate,
    pub aqi: u16,
}

impl OutputRecord {
    /// Date rendered as `year/month/day` without zero padding
    pub fn formatted_date(&self) -> String {
        format_date(self.date)
    }
}

/// Render a date as `YYYY/M/D`, e.g. `2024/3/7`
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}

/// Statistics for a single conversion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// 1-based line number of the table header
    pub header_line: usize,

    /// Metadata lines discarded ahead of the header
    pub metadata_lines: usize,

    /// Data rows encountered after the header
    pub rows_read: usize,

    /// Rows written to the output
    pub rows_written: usize,

    /// Rows omitted under the skip policy
    pub rows_skipped: usize,

    /// Lowest AQI written
    pub min_aqi: Option<u16>,

    /// Highest AQI written
    pub max_aqi: Option<u16>,

    /// Row errors encountered, rendered for reporting
    pub errors: Vec<String>,

    /// First output lines, header included
    pub preview: Vec<String>,

    /// Wall-clock processing time
    pub elapsed: Duration,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written output row
    pub fn record_output(&mut self, record: &OutputRecord) {
        self.rows_written += 1;
        self.min_aqi = Some(self.min_aqi.map_or(record.aqi, |min| min.min(record.aqi)));
        self.max_aqi = Some(self.max_aqi.map_or(record.aqi, |max| max.max(record.aqi)));
    }

    /// Record a row that was dropped
    pub fn record_skipped(&mut self, error: &RowError) {
        self.rows_skipped += 1;
        self.errors.push(error.to_string());
    }

    /// Health category of the worst reading
    pub fn peak_category(&self) -> Option<AqiCategory> {
        self.max_aqi.map(AqiCategory::from_aqi)
    }

    /// Share of data rows that made it into the output, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.rows_read == 0 {
            0.0
        } else {
            (self.rows_written as f64 / self.rows_read as f64) * 100.0
        }
    }
}
