//! Memory health probe for memprobe-rs.
//!
//! This crate judges host memory health from the output of the `free`
//! utility: it parses the version-dependent tabular report into a normalized
//! [`MemorySnapshot`], evaluates RAM and swap usage against four percentage
//! thresholds, and produces a monitoring-plugin status line with performance
//! data.
//!
//! # Examples
//!
//! ```rust,no_run
//! use memprobe_rs_memory::{MemoryProbe, RawThresholds};
//! use memprobe_rs_core::Probe;
//!
//! let mut probe = MemoryProbe::new(RawThresholds::new("90", "95", "75", "90"), false);
//! let output = probe.check()?;
//! println!("{}", output.render());
//! # Ok::<(), memprobe_rs_core::ProbeError>(())
//! ```

pub mod free;
pub mod probe;
pub mod snapshot;
pub mod thresholds;

pub use probe::MemoryProbe;
pub use snapshot::{FreeLayout, FreeVersion, MemRecord, MemorySnapshot, SwapRecord};
pub use thresholds::{evaluate, Evaluation, RawThresholds, ThresholdSet};
