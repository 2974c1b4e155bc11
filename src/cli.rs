//! Command-line interface components.

use crate::aqi::RoundingMode;
use crate::config::{ConversionConfig, RowErrorPolicy};
use crate::constants::DEFAULT_PREVIEW_LINES;
use crate::header::HeaderPolicy;
use crate::models::ConversionStats;
use crate::processor::AqiProcessor;
use crate::writer::ValueColumn;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "pm25-aqi")]
#[command(about = "Convert PM2.5 sensor exports into a date/AQI CSV using US EPA breakpoints")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Sensor export to convert (metadata lines, then a 'date,...' table)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Destination CSV, replaced only if the conversion succeeds
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Name the value column 'aqi' instead of the legacy 'pm25'
    #[arg(long)]
    pub aqi_header: bool,

    /// What to do with rows that cannot be parsed
    #[arg(long, value_enum, default_value_t = RowErrorArg::Collect)]
    pub on_row_error: RowErrorArg,

    /// Rounding applied to interpolated AQI values
    #[arg(long, value_enum, default_value_t = RoundingArg::HalfAwayFromZero)]
    pub rounding: RoundingArg,

    /// Read the first line as the header when no 'date,' line exists
    #[arg(long)]
    pub header_fallback: bool,

    /// Number of output lines to show after converting
    #[arg(long, default_value_t = DEFAULT_PREVIEW_LINES)]
    pub preview: usize,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors (overrides -v)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RowErrorArg {
    FailFast,
    Collect,
    Skip,
}

impl From<RowErrorArg> for RowErrorPolicy {
    fn from(arg: RowErrorArg) -> Self {
        match arg {
            RowErrorArg::FailFast => RowErrorPolicy::FailFast,
            RowErrorArg::Collect => RowErrorPolicy::Collect,
            RowErrorArg::Skip => RowErrorPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoundingArg {
    HalfAwayFromZero,
    HalfEven,
}

impl From<RoundingArg> for RoundingMode {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::HalfAwayFromZero => RoundingMode::HalfAwayFromZero,
            RoundingArg::HalfEven => RoundingMode::HalfEven,
        }
    }
}

impl Args {
    /// Build the conversion configuration from the parsed arguments
    pub fn to_config(&self) -> ConversionConfig {
        let header_policy = if self.header_fallback {
            HeaderPolicy::FallbackToStart
        } else {
            HeaderPolicy::Strict
        };
        let value_column = if self.aqi_header {
            ValueColumn::Aqi
        } else {
            ValueColumn::Pm25
        };

        ConversionConfig::default()
            .with_header_policy(header_policy)
            .with_row_error_policy(self.on_row_error.into())
            .with_rounding(self.rounding.into())
            .with_value_column(value_column)
            .with_preview_lines(if self.quiet { 0 } else { self.preview })
    }

    /// Get the log level implied by the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

/// Default filter directive when `RUST_LOG` is unset
fn default_directive(args: &Args) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), args.get_log_level())
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(args)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", args.get_log_level());
}

/// Run a conversion for the parsed arguments and print the summary
pub fn run(args: &Args) -> Result<ConversionStats> {
    let config = args.to_config();
    debug!("Command line arguments: {:?}", args);

    let processor = AqiProcessor::new(config);
    let stats = processor
        .convert_file(&args.input, &args.output)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    if !args.quiet {
        print_summary(args, &stats);
    }

    Ok(stats)
}

fn print_summary(args: &Args, stats: &ConversionStats) {
    println!("{}", "Conversion complete".bright_green().bold());
    println!("  Output:   {}", args.output.display().to_string().cyan());
    println!(
        "  Rows:     {} written, {} skipped ({:.1}% converted, header on line {})",
        stats.rows_written,
        stats.rows_skipped,
        stats.success_rate(),
        stats.header_line
    );

    if let (Some(min), Some(max), Some(category)) =
        (stats.min_aqi, stats.max_aqi, stats.peak_category())
    {
        println!("  AQI:      {} to {} (peak: {})", min, max, category);
    }

    if !stats.errors.is_empty() {
        println!("{}", "Skipped rows:".yellow().bold());
        for error in &stats.errors {
            println!("  {}", error.yellow());
        }
    }

    if !stats.preview.is_empty() {
        println!();
        println!("{}", "First lines:".bold());
        for line in &stats.preview {
            println!("  {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AqiError;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pm25-aqi").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_map_to_default_config() {
        let args = parse(&["in.csv", "out.csv"]);
        let config = args.to_config();
        let defaults = ConversionConfig::default();

        assert_eq!(args.input, PathBuf::from("in.csv"));
        assert_eq!(config.header_policy, defaults.header_policy);
        assert_eq!(config.row_error_policy, defaults.row_error_policy);
        assert_eq!(config.rounding, defaults.rounding);
        assert_eq!(config.value_column, defaults.value_column);
        assert_eq!(config.preview_lines, DEFAULT_PREVIEW_LINES);
        assert_eq!(args.get_log_level(), "warn");
    }

    #[test]
    fn test_all_options() {
        let args = parse(&[
            "in.csv",
            "out.csv",
            "--aqi-header",
            "--on-row-error",
            "skip",
            "--rounding",
            "half-even",
            "--header-fallback",
            "--preview",
            "3",
            "-vv",
        ]);
        let config = args.to_config();

        assert_eq!(config.value_column, ValueColumn::Aqi);
        assert_eq!(config.row_error_policy, RowErrorPolicy::Skip);
        assert_eq!(config.rounding, RoundingMode::HalfEven);
        assert_eq!(config.header_policy, HeaderPolicy::FallbackToStart);
        assert_eq!(config.preview_lines, 3);
        assert_eq!(args.get_log_level(), "debug");
    }

    #[test]
    fn test_quiet_disables_preview() {
        let args = parse(&["in.csv", "out.csv", "-q"]);

        assert_eq!(args.to_config().preview_lines, 0);
        assert_eq!(args.get_log_level(), "error");
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Args::try_parse_from(["pm25-aqi", "in.csv"]).is_err());
    }

    #[test]
    fn test_default_directive_follows_verbosity() {
        assert_eq!(default_directive(&parse(&["in.csv", "out.csv"])), "pm25_aqi=warn");
        assert_eq!(
            default_directive(&parse(&["in.csv", "out.csv", "-vvv"])),
            "pm25_aqi=trace"
        );
        assert_eq!(
            default_directive(&parse(&["in.csv", "out.csv", "-v", "-q"])),
            "pm25_aqi=error"
        );
    }

    #[test]
    fn test_run_reports_missing_input_with_context() {
        let args = parse(&["/nonexistent/in.csv", "/nonexistent/out.csv", "-q"]);

        let error = run(&args).unwrap_err();
        let message = format!("{:#}", error);

        assert!(message.contains("Failed to convert /nonexistent/in.csv"));
        assert!(message.contains("Input file not found: /nonexistent/in.csv"));
        assert!(matches!(
            error.downcast_ref::<AqiError>(),
            Some(AqiError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_run_converts_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("unformatted.csv");
        let output = dir.path().join("formatted.csv");
        std::fs::write(
            &input,
            "# sensor export\ndate,median\n2024-03-07T00:00:00Z,10.0\n2024-03-08T00:00:00Z,bad\n",
        )
        .unwrap();

        let args = parse(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--on-row-error",
            "skip",
            "--preview",
            "2",
        ]);
        let stats = run(&args).unwrap();

        assert_eq!(stats.rows_written, 1);
        assert_eq!(stats.rows_skipped, 1);
        assert_eq!(stats.success_rate(), 50.0);
        assert_eq!(stats.preview, vec!["date,pm25", "2024/3/7,42"]);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "date,pm25\n2024/3/7,42\n"
        );
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(
            Args::try_parse_from(["pm25-aqi", "in.csv", "out.csv", "--on-row-error", "retry"])
                .is_err()
        );
    }
}
