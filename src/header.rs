//! Header line location for semi-structured sensor exports.
//!
//! Sensor exports carry free-form metadata and comment lines ahead of the
//! tabular section. The table starts at the first line beginning with
//! `date,`; everything before it is discarded.

use crate::constants::HEADER_LINE_PREFIX;
use crate::error::{AqiError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Behaviour when no header line is present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// Fail with `HeaderNotFound`
    #[default]
    Strict,
    /// Treat the whole input as the table, first line as header
    FallbackToStart,
}

/// Position of the tabular section within the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    /// 0-based index of the header line
    pub line_index: usize,

    /// Byte offset of the header line within the content
    pub byte_offset: usize,

    /// Number of metadata lines skipped before the header
    pub skipped_lines: usize,

    /// Whether the location came from the fallback policy
    pub fallback: bool,
}

impl HeaderLocation {
    /// 1-based line number of the header, as a text editor shows it
    pub fn line_number(&self) -> usize {
        self.line_index + 1
    }
}

/// Find the header line of the tabular section
pub fn locate_header(content: &str, policy: HeaderPolicy) -> Result<HeaderLocation> {
    let mut byte_offset = 0;

    for (line_index, line) in content.split_inclusive('\n').enumerate() {
        if line.starts_with(HEADER_LINE_PREFIX) {
            debug!(
                "Header found on line {} after {} metadata lines",
                line_index + 1,
                line_index
            );
            return Ok(HeaderLocation {
                line_index,
                byte_offset,
                skipped_lines: line_index,
                fallback: false,
            });
        }
        byte_offset += line.len();
    }

    match policy {
        HeaderPolicy::Strict => Err(AqiError::HeaderNotFound {
            path: PathBuf::from("<input>"),
        }),
        HeaderPolicy::FallbackToStart => {
            warn!(
                "No '{}' header line found, treating the first line as the header",
                HEADER_LINE_PREFIX
            );
            Ok(HeaderLocation {
                line_index: 0,
                byte_offset: 0,
                skipped_lines: 0,
                fallback: true,
            })
        }
    }
}

/// Split content into its metadata lines and its tabular section
pub fn split_sections<'a>(
    content: &'a str,
    location: &HeaderLocation,
) -> (Vec<&'a str>, &'a str) {
    let metadata = content[..location.byte_offset].lines().collect();
    (metadata, &content[location.byte_offset..])
}
