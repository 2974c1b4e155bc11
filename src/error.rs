//! Error handling for PM2.5 to AQI conversion.
//!
//! Provides error types with context for input loading, header location,
//! row-level parse failures and output writing.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of row errors rendered inline in an error message
const ROW_ERRORS_DISPLAYED: usize = 5;

#[derive(Error, Debug)]
pub enum AqiError {
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Input file could not be read: {path} - {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No header line starting with 'date,' found in file: {path}")]
    HeaderNotFound { path: PathBuf },

    #[error("Required column '{column}' missing from header on line {header_line}")]
    MissingColumn {
        column: String,
        header_line: usize,
    },

    #[error("{}", format_row_errors(.errors))]
    RowParse { errors: Vec<RowError> },

    #[error("Failed to write output file: {path} - {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AqiError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an output write error for a destination path
    pub fn output_write(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::OutputWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Rebind a header error raised on in-memory content to the file it came from
    pub(crate) fn with_input_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::HeaderNotFound { .. } => Self::HeaderNotFound {
                path: path.to_path_buf(),
            },
            other => other,
        }
    }
}

/// A single data row that could not be turned into a record
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the input file
    pub line: usize,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowErrorKind {
    FieldCount { expected: usize, found: usize },
    EmptyField { column: String },
    InvalidDate { value: String },
    InvalidConcentration { value: String },
    Malformed { message: String },
}

impl RowError {
    pub fn new(line: usize, kind: RowErrorKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            RowErrorKind::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            RowErrorKind::EmptyField { column } => write!(f, "empty value for '{}'", column),
            RowErrorKind::InvalidDate { value } => {
                write!(f, "invalid ISO-8601 date '{}'", value)
            }
            RowErrorKind::InvalidConcentration { value } => {
                write!(f, "invalid PM2.5 concentration '{}'", value)
            }
            RowErrorKind::Malformed { message } => write!(f, "malformed row ({})", message),
        }
    }
}

impl std::error::Error for RowError {}

fn format_row_errors(errors: &[RowError]) -> String {
    let mut message = format!("{} row(s) could not be parsed", errors.len());
    for error in errors.iter().take(ROW_ERRORS_DISPLAYED) {
        message.push_str("\n  ");
        message.push_str(&error.to_string());
    }
    if errors.len() > ROW_ERRORS_DISPLAYED {
        message.push_str(&format!(
            "\n  ... and {} more",
            errors.len() - ROW_ERRORS_DISPLAYED
        ));
    }
    message
}

pub type Result<T> = std::result::Result<T, AqiError>;
