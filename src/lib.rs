//! PM2.5 to AQI converter library
//!
//! Converts raw PM2.5 sensor exports (metadata lines followed by a
//! `date,...,median,...` table) into a two-column `date,aqi` dataset using the
//! US EPA breakpoint table.
//!
//! This library provides tools for:
//! - Locating the tabular section behind free-form metadata lines
//! - Reading rows lazily with per-row error reporting
//! - Converting concentrations to AQI with a documented rounding convention
//! - Writing the output atomically so failed runs leave nothing behind
//!
//! ```no_run
//! use pm25_aqi::{AqiProcessor, ConversionConfig};
//! use std::path::Path;
//!
//! # fn example() -> pm25_aqi::Result<()> {
//! let processor = AqiProcessor::new(ConversionConfig::default());
//! let stats = processor.convert_file(Path::new("raw.csv"), Path::new("aqi.csv"))?;
//! println!("Wrote {} rows", stats.rows_written);
//! # Ok(())
//! # }
//! ```

pub mod aqi;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod models;
pub mod processor;
pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use aqi::{AqiCategory, RoundingMode, aqi, pm25_to_aqi};
pub use config::{ConversionConfig, RowErrorPolicy};
pub use error::{AqiError, Result, RowError, RowErrorKind};
pub use header::HeaderPolicy;
pub use models::{ConversionStats, InputRecord, OutputRecord};
pub use processor::AqiProcessor;
pub use writer::ValueColumn;
