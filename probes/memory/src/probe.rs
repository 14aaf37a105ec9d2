//! The memory probe: collect, parse, evaluate, report.

use crate::free;
use crate::snapshot::MemorySnapshot;
use crate::thresholds::{evaluate, Evaluation, RawThresholds};
use memprobe_rs_core::{format, CheckOutput, PerfData, Probe, ProbeError, Severity};

/// Service name prefixing every status line this probe emits.
pub const SERVICE: &str = "MEMORY";

/// Memory health probe judging RAM and swap utilization against thresholds.
///
/// # Examples
///
/// ```rust,no_run
/// use memprobe_rs_memory::{MemoryProbe, RawThresholds};
/// use memprobe_rs_core::Probe;
///
/// let mut probe = MemoryProbe::new(RawThresholds::new("90", "95", "75", "90"), false);
/// let output = probe.check()?;
/// println!("{}", output.render());
/// assert!(output.exit_code() <= 3);
/// # Ok::<(), memprobe_rs_core::ProbeError>(())
/// ```
#[derive(Debug)]
pub struct MemoryProbe {
    name: String,
    thresholds: RawThresholds,
    perfdata_only: bool,
}

impl MemoryProbe {
    /// Create a new memory probe.
    ///
    /// With `perfdata_only` set the probe still gathers and reports all
    /// figures but always judges the host OK.
    #[must_use]
    pub fn new(thresholds: RawThresholds, perfdata_only: bool) -> Self {
        Self {
            name: "memory".to_owned(),
            thresholds,
            perfdata_only,
        }
    }

    /// Evaluate a snapshot and assemble the scheduler-facing output.
    #[must_use]
    pub fn output_for(&self, snapshot: &MemorySnapshot) -> CheckOutput {
        let evaluation = evaluate(snapshot, &self.thresholds);

        let severity = if self.perfdata_only {
            Severity::Ok
        } else {
            evaluation.severity
        };

        let mut output = CheckOutput::new(SERVICE, severity, self.summary(snapshot, &evaluation))
            .with_perfdata(PerfData::bytes("USED", snapshot.used))
            .with_perfdata(PerfData::bytes("TOTAL", snapshot.total))
            .with_perfdata(PerfData::bytes("SWAP_USED", snapshot.swap_used))
            .with_perfdata(PerfData::bytes("SWAP_TOTAL", snapshot.swap_total));

        let limits = self.thresholds.parse().ok();

        if let Some(mem_percent) = evaluation.mem_used_percent {
            let mut sample = PerfData::percent("MEM_USED_PCT", mem_percent);
            if let Some(limits) = &limits {
                sample = sample.with_limits(limits.mem_warn, limits.mem_crit);
            }
            output = output.with_perfdata(sample);
        }

        let mut sample = PerfData::percent("SWAP_USED_PCT", evaluation.swap_used_percent);
        if let Some(limits) = &limits {
            sample = sample.with_limits(limits.swap_warn, limits.swap_crit);
        }
        output.with_perfdata(sample)
    }

    fn summary(&self, snapshot: &MemorySnapshot, evaluation: &Evaluation) -> String {
        match evaluation.mem_used_percent {
            Some(mem_percent) => format!(
                "Total: {} MB - Used: {} MB - {:.2}% used --- SWAP: Used: {} MB - {:.2}% used",
                format::bytes_to_mb(snapshot.total),
                format::bytes_to_mb(snapshot.used),
                mem_percent,
                format::bytes_to_mb(snapshot.swap_used),
                evaluation.swap_used_percent,
            ),
            None => "memory total reported as zero, usage is undefined".to_owned(),
        }
    }
}

impl Probe for MemoryProbe {
    type Error = ProbeError;

    fn check(&mut self) -> Result<CheckOutput, Self::Error> {
        let collected = free::collect()?;
        let snapshot = MemorySnapshot::from_free_output(&collected.report, &collected.version)?;
        tracing::debug!(?snapshot, "parsed memory snapshot");

        Ok(self.output_for(&snapshot))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn check_availability(&self) -> Result<(), Self::Error> {
        free::check_available()
    }
}
