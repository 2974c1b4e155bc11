//! Application constants for the PM2.5 to AQI converter
//!
//! This module contains input/output format markers, column names and
//! default values used throughout the converter.

// =============================================================================
// Input Format
// =============================================================================

/// Prefix identifying the column-header line of the tabular section
pub const HEADER_LINE_PREFIX: &str = "date,";

/// Input column names
pub mod columns {
    /// Timestamp of the reading (ISO-8601)
    pub const DATE: &str = "date";

    /// Median PM2.5 concentration for the period (µg/m³)
    pub const MEDIAN: &str = "median";

    /// Columns every input table must provide, in lookup order
    pub const REQUIRED: [&str; 2] = [DATE, MEDIAN];
}

// =============================================================================
// Output Format
// =============================================================================

/// Output column holding the formatted date
pub const OUTPUT_DATE_COLUMN: &str = "date";

/// Legacy output value column name (holds the AQI score despite its name)
pub const OUTPUT_PM25_COLUMN: &str = "pm25";

/// Output value column name that matches its content
pub const OUTPUT_AQI_COLUMN: &str = "aqi";

// =============================================================================
// AQI Scale
// =============================================================================

/// Lowest AQI score
pub const AQI_MIN: u16 = 0;

/// Saturation AQI score for concentrations above the highest breakpoint
pub const AQI_MAX: u16 = 500;

/// Highest concentration covered by the breakpoint table (µg/m³)
pub const MAX_BREAKPOINT_CONCENTRATION: f64 = 500.4;

// =============================================================================
// Reporting Defaults
// =============================================================================

/// Number of output lines shown in the summary preview
pub const DEFAULT_PREVIEW_LINES: usize = 10;
