//! Conversion pipeline: header location, row reading, AQI conversion and
//! output writing.
//!
//! The whole input is read into memory and processed in a single pass.
//! File output goes to a temporary file beside the destination which is only
//! moved into place once every row converted, so a failed run never leaves a
//! partial dataset behind.

use crate::aqi::pm25_to_aqi;
use crate::config::{ConversionConfig, RowErrorPolicy};
use crate::constants::OUTPUT_DATE_COLUMN;
use crate::error::{AqiError, Result};
use crate::header::{locate_header, split_sections};
use crate::models::{ConversionStats, InputRecord, OutputRecord};
use crate::reader::RecordReader;
use crate::writer::CsvOutputWriter;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, trace, warn};

/// UTF-8 byte order mark some spreadsheet exports prepend
const BOM: char = '\u{feff}';

/// Drives a conversion according to a [`ConversionConfig`]
#[derive(Debug, Clone, Default)]
pub struct AqiProcessor {
    config: ConversionConfig,
}

impl AqiProcessor {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert `input` into a date/AQI CSV at `output`
    ///
    /// `output` is created or replaced only when the conversion succeeds.
    pub fn convert_file(&self, input: &Path, output: &Path) -> Result<ConversionStats> {
        let start_time = Instant::now();
        info!("Converting {} -> {}", input.display(), output.display());

        self.config.validate()?;
        ensure_distinct_paths(input, output)?;

        let content = read_input(input)?;
        debug!("Read {} bytes from {}", content.len(), input.display());

        let output_dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file =
            NamedTempFile::new_in(output_dir).map_err(|e| AqiError::output_write(output, e))?;

        let mut stats = self
            .convert_str(&content, BufWriter::new(temp_file.as_file_mut()))
            .map_err(|error| match error {
                AqiError::Csv(e) => AqiError::output_write(output, e),
                AqiError::Io(e) => AqiError::output_write(output, e),
                other => other.with_input_path(input),
            })?;

        match fs::metadata(output) {
            Ok(existing) => temp_file
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| AqiError::output_write(output, e))?,
            Err(_) => set_default_permissions(&temp_file, output)?,
        }

        temp_file
            .persist(output)
            .map_err(|e| AqiError::output_write(output, e.error))?;

        stats.elapsed = start_time.elapsed();
        info!(
            "Wrote {} rows to {} in {:.2?}",
            stats.rows_written,
            output.display(),
            stats.elapsed
        );

        Ok(stats)
    }

    /// Convert in-memory `content`, writing CSV rows to `sink`
    ///
    /// On error the sink may hold partial output and must be discarded.
    pub fn convert_str<W: Write>(&self, content: &str, sink: W) -> Result<ConversionStats> {
        let start_time = Instant::now();
        let content = content.strip_prefix(BOM).unwrap_or(content);

        let location = locate_header(content, self.config.header_policy)?;
        let (metadata, table) = split_sections(content, &location);
        for line in &metadata {
            trace!("Skipping metadata: {}", line);
        }

        let mut stats = ConversionStats::new();
        stats.header_line = location.line_number();
        stats.metadata_lines = location.skipped_lines;

        let reader = RecordReader::new(table, location.line_index)?;
        debug!(
            "Table on line {} with {} columns",
            stats.header_line,
            reader.columns().field_count
        );

        let value_column = self.config.value_column;
        let mut writer = CsvOutputWriter::new(sink, value_column);
        writer.write_header()?;
        self.push_preview(
            &mut stats,
            format!("{},{}", OUTPUT_DATE_COLUMN, value_column.name()),
        );

        let mut row_errors = Vec::new();
        for result in reader {
            stats.rows_read += 1;

            match result {
                Ok(record) => {
                    // output is discarded once a row has failed
                    if !row_errors.is_empty() {
                        continue;
                    }

                    let converted = self.convert_record(&record);
                    writer.write_record(&converted)?;
                    stats.record_output(&converted);
                    self.push_preview(
                        &mut stats,
                        format!("{},{}", converted.formatted_date(), converted.aqi),
                    );
                }
                Err(error) => match self.config.row_error_policy {
                    RowErrorPolicy::FailFast => {
                        return Err(AqiError::RowParse {
                            errors: vec![error],
                        });
                    }
                    RowErrorPolicy::Collect => {
                        debug!("Row error: {}", error);
                        row_errors.push(error);
                    }
                    RowErrorPolicy::Skip => {
                        warn!("Skipping row, {}", error);
                        stats.record_skipped(&error);
                    }
                },
            }
        }

        if !row_errors.is_empty() {
            return Err(AqiError::RowParse { errors: row_errors });
        }

        let mut sink = writer.finish()?;
        sink.flush()?;
        stats.elapsed = start_time.elapsed();

        info!(
            "Converted {} of {} rows ({} skipped)",
            stats.rows_written, stats.rows_read, stats.rows_skipped
        );

        Ok(stats)
    }

    /// Convert a single input record
    pub fn convert_record(&self, record: &InputRecord) -> OutputRecord {
        OutputRecord {
            date: record.date(),
            aqi: pm25_to_aqi(record.median, self.config.rounding),
        }
    }

    fn push_preview(&self, stats: &mut ConversionStats, line: String) {
        if stats.preview.len() < self.config.preview_lines {
            stats.preview.push(line);
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => AqiError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => AqiError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn ensure_distinct_paths(input: &Path, output: &Path) -> Result<()> {
    if let (Ok(input), Ok(output)) = (input.canonicalize(), output.canonicalize()) {
        if input == output {
            return Err(AqiError::configuration(format!(
                "Output path would overwrite the input file: {}",
                output.display()
            )));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(temp_file: &NamedTempFile, output: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    temp_file
        .as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(|e| AqiError::output_write(output, e))
}

#[cfg(not(unix))]
fn set_default_permissions(_temp_file: &NamedTempFile, _output: &Path) -> Result<()> {
    Ok(())
}
