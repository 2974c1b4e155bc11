//! CSV output for converted AQI rows
//!
//! Writes the two-column `date,<value>` dataset. The value column keeps the
//! legacy `pm25` name by default so existing consumers keep working.

use crate::constants::{OUTPUT_AQI_COLUMN, OUTPUT_DATE_COLUMN, OUTPUT_PM25_COLUMN};
use crate::error::Result;
use crate::models::OutputRecord;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::debug;

/// Name of the output column holding the AQI score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueColumn {
    /// `pm25`, the historical header
    #[default]
    Pm25,
    /// `aqi`
    Aqi,
}

impl ValueColumn {
    pub fn name(&self) -> &'static str {
        match self {
            ValueColumn::Pm25 => OUTPUT_PM25_COLUMN,
            ValueColumn::Aqi => OUTPUT_AQI_COLUMN,
        }
    }
}

/// Streaming writer for output rows
pub struct CsvOutputWriter<W: Write> {
    writer: csv::Writer<W>,
    value_column: ValueColumn,
    rows_written: usize,
}

impl<W: Write> CsvOutputWriter<W> {
    pub fn new(sink: W, value_column: ValueColumn) -> Self {
        let writer = WriterBuilder::new().has_headers(false).from_writer(sink);
        Self {
            writer,
            value_column,
            rows_written: 0,
        }
    }

    /// Write the `date,<value>` header row
    pub fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_record([OUTPUT_DATE_COLUMN, self.value_column.name()])?;
        Ok(())
    }

    /// Write one converted row
    pub fn write_record(&mut self, record: &OutputRecord) -> Result<()> {
        self.writer
            .write_record([record.formatted_date(), record.aqi.to_string()])?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush buffered rows and hand back the sink
    pub fn finish(self) -> Result<W> {
        let rows = self.rows_written;
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))?;
        debug!("Flushed {} output rows", rows);
        Ok(sink)
    }
}
