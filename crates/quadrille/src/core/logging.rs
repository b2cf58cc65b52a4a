//! Logging infrastructure for layout and rendering
//!
//! Structured logging through the `tracing` crate. Every pipeline stage opens
//! a span, so a debug-level run shows where layout time and fallbacks go.
//!
//! # Usage
//!
//! ```rust,no_run
//! use quadrille::core::logging::init_logging;
//!
//! // Initialize with default settings
//! init_logging(None, None).unwrap();
//! ```
//!
//! # Log Levels
//!
//! - `trace`: per-candidate decisions (router candidates, barycenter sweeps)
//! - `debug`: per-stage summaries
//! - `info`: render calls and chosen strategy (default)
//! - `warn`: degraded output (forced layers, fallback routes)
//! - `error`: error messages
//!
//! # Log Formats
//!
//! - `compact`: Single-line format, good for production
//! - `pretty`: Multi-line format with colors, good for development
//! - `json`: JSON format, good for log aggregation systems
//!
//! # Environment Variables
//!
//! - `QUADRILLE_LOG_LEVEL`: Set log level (trace|debug|info|warn|error)
//! - `QUADRILLE_LOG_FORMAT`: Set log format (compact|pretty|json)
//! - `RUST_LOG`: Alternative way to set log level (tracing-subscriber standard)
//!
//! # Adding Tracing to Layout Stages
//!
//! ```rust,ignore
//! use tracing::{debug, span, Level};
//!
//! fn my_stage(graph: &DiagramGraph) {
//!     let stage_span = span!(Level::DEBUG, "my_stage", nodes = graph.node_count());
//!     let _enter = stage_span.enter();
//!     // ... stage logic ...
//!     debug!("Stage completed");
//! }
//! ```
//!
//! # Filtering Logs
//!
//! ```bash
//! # Router decisions only
//! RUST_LOG="quadrille::layout::routing=trace" quadrille layout diagram.json
//!
//! # Everything at info, ordering at trace
//! RUST_LOG="info,quadrille::layout::ordering=trace" quadrille render diagram.json
//! ```

use std::str::FromStr;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line format
    Compact,
    /// Pretty multi-line format with colors
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl LogFormat {
    /// Get all valid format names
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }
}

fn resolve_setting(explicit: Option<&str>, vars: &[&str], default: &str) -> String {
    explicit
        .map(|s| s.to_string())
        .or_else(|| vars.iter().find_map(|v| std::env::var(v).ok()))
        .unwrap_or_else(|| default.to_string())
}

/// Initialize the tracing subscriber with the given log level and format
///
/// # Arguments
///
/// * `level` - Optional log level string (trace|debug|info|warn|error|off).
///   If None, uses `QUADRILLE_LOG_LEVEL` or `RUST_LOG`, or defaults to `info`.
/// * `format` - Optional log format (compact|pretty|json).
///   If None, uses `QUADRILLE_LOG_FORMAT`, or defaults to `compact`.
///
/// # Returns
///
/// Returns an error for an unknown format, or when a global subscriber is
/// already installed.
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = resolve_setting(level, &["QUADRILLE_LOG_LEVEL", "RUST_LOG"], "info");
    let log_format = resolve_setting(format, &["QUADRILLE_LOG_FORMAT"], "compact");

    let filter = if log_level == "off" {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let format = LogFormat::from_str(&log_format)
        .map_err(|e| format!("Invalid log format: {}", e))?;

    // Logs go to stderr so stdout stays clean for JSON output
    match format {
        LogFormat::Compact => {
            Registry::default()
                .with(filter)
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_level(true)
                        .with_file(false)
                        .with_line_number(false)
                        .with_span_events(FmtSpan::NONE),
                )
                .try_init()?;
        }
        LogFormat::Pretty => {
            Registry::default()
                .with(filter)
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_span_events(FmtSpan::ACTIVE)
                        .pretty(),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            Registry::default()
                .with(filter)
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_span_events(FmtSpan::ACTIVE)
                        .json(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Initialize logging with default settings (info level, compact format)
pub fn init_default_logging() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_format_variants() {
        let variants = LogFormat::variants();
        assert_eq!(variants.len(), 3);
        assert!(variants.contains(&"pretty"));
    }

    #[test]
    fn test_explicit_setting_wins() {
        assert_eq!(
            resolve_setting(Some("trace"), &["QUADRILLE_TEST_UNSET_VAR"], "info"),
            "trace"
        );
        assert_eq!(
            resolve_setting(None, &["QUADRILLE_TEST_UNSET_VAR"], "info"),
            "info"
        );
    }
}
