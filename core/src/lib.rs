//! # memprobe-rs-core
//!
//! Core library for the memprobe-rs probe suite providing shared functionality
//! for one-shot host health checks in monitoring-plugin format.
//!
//! ## Features
//!
//! - **Severity model** - Ordered OK/WARNING/CRITICAL scale plus out-of-band UNKNOWN
//! - **Plugin output format** - Status line and performance-data rendering
//! - **Common probe trait** - Standardized one-shot check interface
//! - **Configuration management** - RON-based configuration with defaults
//! - **Error handling** - Comprehensive error types with context
//!
//! ## Quick Start
//!
//! ```rust
//! use memprobe_rs_core::{Probe, CheckOutput, Severity, ProbeError};
//!
//! struct LoadProbe {
//!     name: String,
//! }
//!
//! impl Probe for LoadProbe {
//!     type Error = ProbeError;
//!
//!     fn check(&mut self) -> Result<CheckOutput, Self::Error> {
//!         Ok(CheckOutput::new("LOAD", Severity::Ok, "load average within limits"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         &self.name
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of a probe check, ordered by how unhealthy the host is.
///
/// `Ok < Warning < Critical` form the ordinal health scale used when combining
/// per-resource results. `Unknown` sits outside that scale: it signals that the
/// check could not be trusted (malformed thresholds, degenerate input) and must
/// never be silently downgraded to `Ok`.
///
/// The discriminants match the standard monitoring-plugin exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Resource usage is within all thresholds.
    Ok = 0,
    /// Warning threshold exceeded.
    Warning = 1,
    /// Critical threshold exceeded.
    Critical = 2,
    /// The check could not produce a trustworthy result.
    Unknown = 3,
}

impl Severity {
    /// Exit code expected by the monitoring scheduler.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        self as i32
    }

    /// Status label used in the rendered status line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Combine two severities, keeping the worse one.
    ///
    /// `Unknown` dominates everything: a result that cannot be trusted must not
    /// be masked by a healthy sibling check.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One performance-data sample in monitoring-plugin perfdata grammar.
///
/// Renders as `LABEL=value<uom>;<warn>;<crit>;;` with empty fields for absent
/// cut-points, e.g. `USED=1374179328B;;;;` or `MEM_USED_PCT=42.17%;90;95;;`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfData {
    /// Sample label, conventionally upper-case.
    pub label: String,
    /// Pre-formatted numeric value.
    pub value: String,
    /// Unit of measure suffix (`B`, `%`, `s`, or empty).
    pub unit: &'static str,
    /// Warning cut-point, if one applies to this sample.
    pub warn: Option<f64>,
    /// Critical cut-point, if one applies to this sample.
    pub crit: Option<f64>,
}

impl PerfData {
    /// Create a perfdata sample for a raw byte count.
    #[must_use]
    pub fn bytes(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
            unit: "B",
            warn: None,
            crit: None,
        }
    }

    /// Create a perfdata sample for a percentage, rendered with two decimals.
    #[must_use]
    pub fn percent(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value: format!("{value:.2}"),
            unit: "%",
            warn: None,
            crit: None,
        }
    }

    /// Attach warning/critical cut-points to this sample.
    #[must_use]
    pub fn with_limits(mut self, warn: f64, crit: f64) -> Self {
        self.warn = Some(warn);
        self.crit = Some(crit);
        self
    }
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}{};", self.label, self.value, self.unit)?;
        if let Some(warn) = self.warn {
            write!(f, "{warn}")?;
        }
        f.write_str(";")?;
        if let Some(crit) = self.crit {
            write!(f, "{crit}")?;
        }
        f.write_str(";;")
    }
}

/// Complete result of one probe run, ready for the scheduler.
///
/// # Examples
///
/// ```rust
/// use memprobe_rs_core::{CheckOutput, PerfData, Severity};
///
/// let output = CheckOutput::new("MEMORY", Severity::Warning, "Used: 7300 MB - 91.25% used")
///     .with_perfdata(PerfData::bytes("USED", 7_300));
///
/// assert_eq!(output.exit_code(), 1);
/// assert_eq!(
///     output.render(),
///     "MEMORY WARNING: Used: 7300 MB - 91.25% used | USED=7300B;;;;"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutput {
    /// Service name prefixing the status line (e.g. `MEMORY`).
    pub service: String,
    /// Overall severity of the check.
    pub severity: Severity,
    /// Human-readable one-line summary.
    pub summary: String,
    /// Performance-data samples appended after the `|` separator.
    pub perfdata: Vec<PerfData>,
}

impl CheckOutput {
    /// Create a new output with an empty perfdata list.
    #[must_use]
    pub fn new(service: impl Into<String>, severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            severity,
            summary: summary.into(),
            perfdata: Vec::new(),
        }
    }

    /// Append one perfdata sample.
    #[must_use]
    pub fn with_perfdata(mut self, sample: PerfData) -> Self {
        self.perfdata.push(sample);
        self
    }

    /// Exit code to hand back to the scheduler.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.severity.exit_code()
    }

    /// Render the full status line, perfdata included.
    #[must_use]
    pub fn render(&self) -> String {
        let mut line = format!("{} {}: {}", self.service, self.severity.label(), self.summary);
        if !self.perfdata.is_empty() {
            line.push_str(" | ");
            let samples: Vec<String> = self.perfdata.iter().map(ToString::to_string).collect();
            line.push_str(&samples.join(" "));
        }
        line
    }
}

impl fmt::Display for CheckOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Default threshold percentages applied when neither the CLI nor the config
/// file overrides them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThresholdDefaults {
    /// Memory usage percentage that triggers a warning.
    #[serde(default = "default_mem_warn")]
    pub mem_warn: f64,
    /// Memory usage percentage that triggers a critical alert.
    #[serde(default = "default_mem_crit")]
    pub mem_crit: f64,
    /// Swap usage percentage that triggers a warning.
    #[serde(default = "default_swap_warn")]
    pub swap_warn: f64,
    /// Swap usage percentage that triggers a critical alert.
    #[serde(default = "default_swap_crit")]
    pub swap_crit: f64,
}

fn default_mem_warn() -> f64 {
    90.0
}
fn default_mem_crit() -> f64 {
    95.0
}
fn default_swap_warn() -> f64 {
    75.0
}
fn default_swap_crit() -> f64 {
    90.0
}

impl Default for ThresholdDefaults {
    fn default() -> Self {
        Self {
            mem_warn: default_mem_warn(),
            mem_crit: default_mem_crit(),
            swap_warn: default_swap_warn(),
            swap_crit: default_swap_crit(),
        }
    }
}

/// Global configuration loaded from `~/.config/memprobe-rs/config.ron`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Default threshold percentages.
    #[serde(default)]
    pub thresholds: ThresholdDefaults,
    /// Always report OK and only gather perfdata.
    #[serde(default)]
    pub perfdata_only: bool,
}

impl GlobalConfig {
    /// Load configuration from the standard config file location.
    ///
    /// Searches for config in:
    /// 1. `~/.config/memprobe-rs/config.ron`
    /// 2. `~/.memprobe-rs/config.ron` (fallback)
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ProbeError> {
        if let Some(config_path) = Self::find_config_file() {
            tracing::debug!(path = %config_path.display(), "loading config file");
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ProbeError> {
        let content = std::fs::read_to_string(path)?;

        let config: GlobalConfig = ron::from_str(&content).map_err(|e| ProbeError::Parse {
            message: format!("Failed to parse config file: {}", e),
            source: None,
        })?;

        Ok(config)
    }

    /// Find the config file in standard locations.
    #[must_use]
    pub fn find_config_file() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_path = config_dir.join("memprobe-rs").join("config.ron");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".memprobe-rs").join("config.ron");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        None
    }

    /// Get the default config file path for writing.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("memprobe-rs").join("config.ron"))
    }
}

/// Trait for all host probes producing monitoring-plugin output.
///
/// A probe performs one self-contained check per call: gather data, judge it
/// against its thresholds, and hand back a [`CheckOutput`] the caller can
/// render and translate into an exit code.
pub trait Probe {
    /// Error type for probe operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run one check and return the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data cannot be collected or parsed.
    /// Evaluation-level anomalies are not errors: they surface as
    /// [`Severity::Unknown`] inside a successful result, because a probe must
    /// always produce a determinate severity on its output channel.
    fn check(&mut self) -> Result<CheckOutput, Self::Error>;

    /// Get the unique name/identifier for this probe.
    fn name(&self) -> &str;

    /// Check if the probe is usable on this system.
    ///
    /// Default implementation returns `Ok(())`. Probes should override this if
    /// they have specific system requirements.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe is not available or supported.
    fn check_availability(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Utility functions for formatting probe data.
pub mod format {
    /// Format bytes into a human-readable string with appropriate units.
    ///
    /// Uses binary units (1024-based) and shows 1 decimal place for values >= 1KB.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use memprobe_rs_core::format;
    ///
    /// assert_eq!(format::bytes_to_human(512), "512B");
    /// assert_eq!(format::bytes_to_human(1024), "1.0KB");
    /// assert_eq!(format::bytes_to_human(1536), "1.5KB");
    /// assert_eq!(format::bytes_to_human(1048576), "1.0MB");
    /// ```
    #[must_use]
    pub fn bytes_to_human(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
        const THRESHOLD: f64 = 1024.0;

        if bytes == 0 {
            return "0B".to_owned();
        }

        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= THRESHOLD && unit_idx < UNITS.len() - 1 {
            size /= THRESHOLD;
            unit_idx += 1;
        }

        if unit_idx == 0 {
            format!("{size:.0}{}", UNITS[unit_idx])
        } else {
            format!("{size:.1}{}", UNITS[unit_idx])
        }
    }

    /// Convert a byte count to whole megabytes, truncating.
    ///
    /// Status-line summaries report megabytes while perfdata stays in bytes.
    #[must_use]
    pub const fn bytes_to_mb(bytes: u64) -> u64 {
        bytes / 1024 / 1024
    }
}

/// Common error types for probe operations.
///
/// This enum provides a comprehensive set of error types that cover the most
/// common failure modes in probe implementations.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// I/O error occurred while reading probe data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing probe data from text format.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what failed to parse
        message: String,
        /// Optional source error for chaining
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error (invalid settings, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration issue
        message: String,
        /// The invalid configuration value if applicable
        value: Option<String>,
    },

    /// Probe is not available on this system.
    #[error("Probe unavailable: {reason}")]
    Unavailable {
        /// Reason why the probe is unavailable
        reason: String,
        /// Whether this is a temporary or permanent condition
        is_temporary: bool,
    },

    /// An external data-collection command failed.
    #[error("Command `{command}` failed: {reason}")]
    Command {
        /// The command that failed
        command: String,
        /// What went wrong running it
        reason: String,
    },
}

impl ProbeError {
    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with a source error.
    pub fn parse_with_source<S: Into<String>, E>(message: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            value: None,
        }
    }

    /// Create a new configuration error with the invalid value.
    pub fn config_with_value<S: Into<String>, V: Into<String>>(message: S, value: V) -> Self {
        Self::Config {
            message: message.into(),
            value: Some(value.into()),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            is_temporary: false,
        }
    }

    /// Create a new command error.
    pub fn command<C: Into<String>, R: Into<String>>(command: C, reason: R) -> Self {
        Self::Command {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error represents a temporary condition.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        match self {
            Self::Unavailable { is_temporary, .. } => *is_temporary,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Unknown);
    }

    #[test]
    fn test_severity_exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Ok.label(), "OK");
        assert_eq!(Severity::Warning.label(), "WARNING");
        assert_eq!(Severity::Critical.label(), "CRITICAL");
        assert_eq!(Severity::Unknown.label(), "UNKNOWN");
    }

    #[test]
    fn test_severity_worst() {
        assert_eq!(Severity::Ok.worst(Severity::Warning), Severity::Warning);
        assert_eq!(Severity::Critical.worst(Severity::Warning), Severity::Critical);
        assert_eq!(Severity::Ok.worst(Severity::Ok), Severity::Ok);
        // Unknown is never masked by a healthier result
        assert_eq!(Severity::Unknown.worst(Severity::Ok), Severity::Unknown);
        assert_eq!(Severity::Critical.worst(Severity::Unknown), Severity::Unknown);
    }

    #[test]
    fn test_perfdata_rendering() {
        let sample = PerfData::bytes("USED", 1_374_179_328);
        assert_eq!(sample.to_string(), "USED=1374179328B;;;;");

        let sample = PerfData::percent("MEM_USED_PCT", 42.173).with_limits(90.0, 95.0);
        assert_eq!(sample.to_string(), "MEM_USED_PCT=42.17%;90;95;;");
    }

    #[test]
    fn test_check_output_rendering() {
        let output = CheckOutput::new("MEMORY", Severity::Ok, "all good")
            .with_perfdata(PerfData::bytes("USED", 100))
            .with_perfdata(PerfData::bytes("TOTAL", 8000));

        assert_eq!(
            output.render(),
            "MEMORY OK: all good | USED=100B;;;; TOTAL=8000B;;;;"
        );
        assert_eq!(output.exit_code(), 0);
    }

    #[test]
    fn test_check_output_without_perfdata() {
        let output = CheckOutput::new("MEMORY", Severity::Unknown, "could not parse thresholds");
        assert_eq!(output.render(), "MEMORY UNKNOWN: could not parse thresholds");
        assert_eq!(output.exit_code(), 3);
    }

    #[test]
    fn test_bytes_to_human() {
        assert_eq!(format::bytes_to_human(0), "0B");
        assert_eq!(format::bytes_to_human(512), "512B");
        assert_eq!(format::bytes_to_human(1024), "1.0KB");
        assert_eq!(format::bytes_to_human(1536), "1.5KB");
        assert_eq!(format::bytes_to_human(1048576), "1.0MB");
        assert_eq!(format::bytes_to_human(1073741824), "1.0GB");
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(format::bytes_to_mb(0), 0);
        assert_eq!(format::bytes_to_mb(1024 * 1024), 1);
        assert_eq!(format::bytes_to_mb(1929613312), 1840);
    }

    #[test]
    fn test_threshold_defaults() {
        let defaults = ThresholdDefaults::default();
        assert_eq!(defaults.mem_warn, 90.0);
        assert_eq!(defaults.mem_crit, 95.0);
        assert_eq!(defaults.swap_warn, 75.0);
        assert_eq!(defaults.swap_crit, 90.0);
        assert!(defaults.mem_warn < defaults.mem_crit);
        assert!(defaults.swap_warn < defaults.swap_crit);
    }

    #[test]
    fn test_global_config_parse() {
        let config: GlobalConfig = ron::from_str(
            "(thresholds: (mem_warn: 85.0, mem_crit: 92.0, swap_warn: 50.0, swap_crit: 80.0), perfdata_only: true)",
        )
        .unwrap();
        assert_eq!(config.thresholds.mem_warn, 85.0);
        assert_eq!(config.thresholds.swap_crit, 80.0);
        assert!(config.perfdata_only);
    }

    #[test]
    fn test_global_config_defaults_when_empty() {
        let config: GlobalConfig = ron::from_str("()").unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_probe_error_constructors() {
        let err = ProbeError::parse("Invalid format");
        assert!(matches!(err, ProbeError::Parse { .. }));

        let err = ProbeError::config_with_value("Invalid setting", "bad_value");
        assert!(matches!(err, ProbeError::Config { .. }));

        let err = ProbeError::command("free -b", "exited with status 1");
        assert_eq!(err.to_string(), "Command `free -b` failed: exited with status 1");

        let err = ProbeError::unavailable("Not supported");
        assert!(!err.is_temporary());
    }
}
