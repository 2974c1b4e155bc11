//! Configuration for a conversion run.
//!
//! Collects the policy choices that are left open by the input format:
//! what to do without a header line, how to treat bad rows, how to round and
//! what to call the output value column.

use crate::aqi::RoundingMode;
use crate::constants::DEFAULT_PREVIEW_LINES;
use crate::error::{AqiError, Result};
use crate::header::HeaderPolicy;
use crate::writer::ValueColumn;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on preview lines kept in memory for the summary
const MAX_PREVIEW_LINES: usize = 1000;

/// Handling of data rows that cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowErrorPolicy {
    /// Abort on the first bad row
    FailFast,
    /// Scan every row, then fail listing all bad rows
    #[default]
    Collect,
    /// Drop bad rows with a warning and keep going
    Skip,
}

/// Settings for a conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Behaviour when no `date,` header line exists
    pub header_policy: HeaderPolicy,

    /// Behaviour on unparseable data rows
    pub row_error_policy: RowErrorPolicy,

    /// Rounding applied to interpolated AQI values
    pub rounding: RoundingMode,

    /// Output value column name
    pub value_column: ValueColumn,

    /// Output lines kept for the summary preview (header included)
    pub preview_lines: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            header_policy: HeaderPolicy::default(),
            row_error_policy: RowErrorPolicy::default(),
            rounding: RoundingMode::default(),
            value_column: ValueColumn::default(),
            preview_lines: DEFAULT_PREVIEW_LINES,
        }
    }
}

impl ConversionConfig {
    pub fn with_header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = policy;
        self
    }

    pub fn with_row_error_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_error_policy = policy;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_value_column(mut self, value_column: ValueColumn) -> Self {
        self.value_column = value_column;
        self
    }

    pub fn with_preview_lines(mut self, lines: usize) -> Self {
        self.preview_lines = lines;
        self
    }

    /// Validate settings before a run
    pub fn validate(&self) -> Result<()> {
        if self.preview_lines > MAX_PREVIEW_LINES {
            return Err(AqiError::configuration(format!(
                "Preview is limited to {} lines, {} requested",
                MAX_PREVIEW_LINES, self.preview_lines
            )));
        }

        debug!("Configuration validated: {:?}", self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();

        assert_eq!(config.header_policy, HeaderPolicy::Strict);
        assert_eq!(config.row_error_policy, RowErrorPolicy::Collect);
        assert_eq!(config.rounding, RoundingMode::HalfAwayFromZero);
        assert_eq!(config.value_column, ValueColumn::Pm25);
        assert_eq!(config.preview_lines, DEFAULT_PREVIEW_LINES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ConversionConfig::default()
            .with_header_policy(HeaderPolicy::FallbackToStart)
            .with_row_error_policy(RowErrorPolicy::Skip)
            .with_rounding(RoundingMode::HalfEven)
            .with_value_column(ValueColumn::Aqi)
            .with_preview_lines(3);

        assert_eq!(config.header_policy, HeaderPolicy::FallbackToStart);
        assert_eq!(config.row_error_policy, RowErrorPolicy::Skip);
        assert_eq!(config.rounding, RoundingMode::HalfEven);
        assert_eq!(config.value_column, ValueColumn::Aqi);
        assert_eq!(config.preview_lines, 3);
    }

    #[test]
    fn test_validate_rejects_huge_preview() {
        let config = ConversionConfig::default().with_preview_lines(MAX_PREVIEW_LINES + 1);
        assert!(matches!(
            config.validate(),
            Err(AqiError::Configuration { .. })
        ));
    }
}
