//! Threshold evaluation for memory snapshots.
//!
//! Thresholds travel as raw strings all the way into evaluation: the
//! scheduler hands the probe whatever the check definition contained, and a
//! value that does not parse as a number must surface as an UNKNOWN result,
//! never as a crash and never as a silent 0%.

use crate::snapshot::MemorySnapshot;
use memprobe_rs_core::{ProbeError, Severity};

/// The four threshold values exactly as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawThresholds {
    /// Memory warning threshold, percent.
    pub mem_warn: String,
    /// Memory critical threshold, percent.
    pub mem_crit: String,
    /// Swap warning threshold, percent.
    pub swap_warn: String,
    /// Swap critical threshold, percent.
    pub swap_crit: String,
}

impl RawThresholds {
    /// Bundle four raw threshold values.
    #[must_use]
    pub fn new(
        mem_warn: impl Into<String>,
        mem_crit: impl Into<String>,
        swap_warn: impl Into<String>,
        swap_crit: impl Into<String>,
    ) -> Self {
        Self {
            mem_warn: mem_warn.into(),
            mem_crit: mem_crit.into(),
            swap_warn: swap_warn.into(),
            swap_crit: swap_crit.into(),
        }
    }

    /// Parse all four values into numeric cut-points.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if any value is not a finite number.
    pub fn parse(&self) -> Result<ThresholdSet, ProbeError> {
        Ok(ThresholdSet {
            mem_warn: parse_percentage("mem_warn", &self.mem_warn)?,
            mem_crit: parse_percentage("mem_crit", &self.mem_crit)?,
            swap_warn: parse_percentage("swap_warn", &self.swap_warn)?,
            swap_crit: parse_percentage("swap_crit", &self.swap_crit)?,
        })
    }
}

fn parse_percentage(name: &str, raw: &str) -> Result<f64, ProbeError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ProbeError::config_with_value(format!("{name} is not a number"), raw))?;
    if !value.is_finite() {
        return Err(ProbeError::config_with_value(
            format!("{name} is not finite"),
            raw,
        ));
    }
    Ok(value)
}

/// Parsed percentage cut-points for memory and swap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    /// Memory usage percentage that triggers a warning.
    pub mem_warn: f64,
    /// Memory usage percentage that triggers a critical alert.
    pub mem_crit: f64,
    /// Swap usage percentage that triggers a warning.
    pub swap_warn: f64,
    /// Swap usage percentage that triggers a critical alert.
    pub swap_crit: f64,
}

/// Result of evaluating one snapshot against one threshold set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Overall severity of the check.
    pub severity: Severity,
    /// Memory usage percentage, `None` when the snapshot total was zero.
    pub mem_used_percent: Option<f64>,
    /// Swap usage percentage.
    pub swap_used_percent: f64,
}

/// Severity of a single resource against its warn/crit cut-points.
///
/// Comparisons are strictly greater-than: a usage exactly on a cut-point does
/// not trigger it. A value above both cut-points is critical.
fn level_for(percent: f64, warn: f64, crit: f64) -> Severity {
    if percent > crit {
        Severity::Critical
    } else if percent > warn {
        Severity::Warning
    } else {
        Severity::Ok
    }
}

/// Evaluate a snapshot against raw thresholds.
///
/// Threshold parsing happens first and short-circuits: if any of the four
/// values is not a number the result is [`Severity::Unknown`] regardless of
/// the actual memory state. A snapshot with an undefined memory percentage
/// (`total == 0`) is likewise UNKNOWN. Otherwise the overall severity is OK
/// when both resources are OK, else the worse of the two per-resource levels.
#[must_use]
pub fn evaluate(snapshot: &MemorySnapshot, thresholds: &RawThresholds) -> Evaluation {
    let mem_used_percent = snapshot.mem_used_percent();
    let swap_used_percent = snapshot.swap_used_percent();

    let parsed = match thresholds.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(%err, "thresholds did not parse, reporting UNKNOWN");
            return Evaluation {
                severity: Severity::Unknown,
                mem_used_percent,
                swap_used_percent,
            };
        }
    };

    let Some(mem_percent) = mem_used_percent else {
        tracing::warn!("memory total is zero, reporting UNKNOWN");
        return Evaluation {
            severity: Severity::Unknown,
            mem_used_percent,
            swap_used_percent,
        };
    };

    let swap_level = level_for(swap_used_percent, parsed.swap_warn, parsed.swap_crit);
    let mem_level = level_for(mem_percent, parsed.mem_warn, parsed.mem_crit);
    tracing::debug!(?mem_level, ?swap_level, mem_percent, swap_used_percent, "per-resource levels");

    // The all-OK case is its own branch rather than a degenerate worst().
    let severity = if mem_level == Severity::Ok && swap_level == Severity::Ok {
        Severity::Ok
    } else {
        mem_level.worst(swap_level)
    };

    Evaluation {
        severity,
        mem_used_percent,
        swap_used_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{MemRecord, SwapRecord};

    fn snapshot(total: u64, used: u64, swap_total: u64, swap_used: u64) -> MemorySnapshot {
        MemorySnapshot::new(
            MemRecord {
                total,
                used,
                free: total.saturating_sub(used),
                shared: 1,
                cache: 1,
                available: None,
            },
            SwapRecord {
                total: swap_total,
                used: swap_used,
                free: swap_total.saturating_sub(swap_used),
            },
        )
    }

    fn thresholds() -> RawThresholds {
        RawThresholds::new("90", "95", "80", "90")
    }

    #[test]
    fn test_all_good() {
        let eval = evaluate(&snapshot(8000, 100, 2000, 0), &thresholds());
        assert_eq!(eval.severity, Severity::Ok);
        assert_eq!(eval.mem_used_percent, Some(1.25));
        assert_eq!(eval.swap_used_percent, 0.0);
    }

    #[test]
    fn test_mem_warn() {
        // 7300 / 8000 = 91.25%
        let eval = evaluate(&snapshot(8000, 7300, 2000, 0), &thresholds());
        assert_eq!(eval.severity, Severity::Warning);
    }

    #[test]
    fn test_mem_crit() {
        // 7900 / 8000 = 98.75%, above both cut-points; crit wins
        let eval = evaluate(&snapshot(8000, 7900, 2000, 0), &thresholds());
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn test_swap_warn() {
        // 1800 / 2000 = 90%: above swap_warn, exactly on swap_crit
        let eval = evaluate(&snapshot(8000, 2000, 2000, 1800), &thresholds());
        assert_eq!(eval.severity, Severity::Warning);
    }

    #[test]
    fn test_swap_crit() {
        // 1900 / 2000 = 95%
        let eval = evaluate(&snapshot(8000, 2000, 2000, 1900), &thresholds());
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn test_swap_trumps_mem() {
        // memory at warning, swap at critical
        let eval = evaluate(&snapshot(8000, 7300, 2000, 1900), &thresholds());
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn test_mem_trumps_swap() {
        // memory at critical, swap healthy
        let eval = evaluate(&snapshot(8000, 7900, 2000, 100), &thresholds());
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn test_mem_critical_swap_warning() {
        // 1700 / 2000 = 85% swap, memory at 98.75%
        let eval = evaluate(&snapshot(8000, 7900, 2000, 1700), &thresholds());
        assert_eq!(eval.severity, Severity::Critical);
    }

    #[test]
    fn test_thresholds_are_strict_inequalities() {
        // exactly 90% memory does not trigger the 90% warning
        let eval = evaluate(&snapshot(8000, 7200, 2000, 0), &thresholds());
        assert_eq!(eval.mem_used_percent, Some(90.0));
        assert_eq!(eval.severity, Severity::Ok);

        // exactly 90% swap does not trigger the 90% critical, only the warning
        let eval = evaluate(&snapshot(8000, 100, 2000, 1800), &thresholds());
        assert_eq!(eval.swap_used_percent, 90.0);
        assert_eq!(eval.severity, Severity::Warning);
    }

    #[test]
    fn test_zero_used_is_ok_for_any_parseable_thresholds() {
        let eval = evaluate(&snapshot(8000, 0, 2000, 0), &RawThresholds::new("0.1", "0.2", "0.1", "0.2"));
        assert_eq!(eval.severity, Severity::Ok);
    }

    #[test]
    fn test_swapless_host_never_triggers_swap_alerts() {
        // swap_total == 0 reads as 0% even with nonzero swap_used figures
        let eval = evaluate(&snapshot(8000, 100, 0, 500), &RawThresholds::new("90", "95", "0.0", "0.0"));
        assert_eq!(eval.swap_used_percent, 0.0);
        assert_eq!(eval.severity, Severity::Ok);
    }

    #[test]
    fn test_bad_warn_value_returns_unknown() {
        let eval = evaluate(
            &snapshot(8000, 100, 2000, 0),
            &RawThresholds::new("90%", "95", "80", "90"),
        );
        assert_eq!(eval.severity, Severity::Unknown);
    }

    #[test]
    fn test_any_bad_threshold_returns_unknown() {
        for bad in [
            RawThresholds::new("", "95", "80", "90"),
            RawThresholds::new("90", "ninety-five", "80", "90"),
            RawThresholds::new("90", "95", "nan", "90"),
            RawThresholds::new("90", "95", "80", "inf"),
        ] {
            let eval = evaluate(&snapshot(8000, 100, 2000, 0), &bad);
            assert_eq!(eval.severity, Severity::Unknown, "thresholds: {bad:?}");
        }
    }

    #[test]
    fn test_zero_total_returns_unknown() {
        let eval = evaluate(&snapshot(0, 0, 2000, 0), &thresholds());
        assert_eq!(eval.severity, Severity::Unknown);
        assert_eq!(eval.mem_used_percent, None);
    }

    #[test]
    fn test_threshold_parse_accepts_decimals_and_whitespace() {
        let parsed = RawThresholds::new(" 90.5 ", "95.0", "80", "90").parse().unwrap();
        assert_eq!(parsed.mem_warn, 90.5);
        assert_eq!(parsed.mem_crit, 95.0);
    }
}
