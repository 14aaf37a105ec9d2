//! Normalized memory snapshot parsed from `free` output.
//!
//! The column layout of `free` changed at procps-ng 3.3.9: newer versions
//! report a combined `buff/cache` column plus an `available` column, older
//! versions report separate `buffers` and `cached` columns and count cache as
//! used memory. Both layouts are normalized here into one [`MemorySnapshot`]
//! shape so nothing downstream needs to know which tool produced the data.

use memprobe_rs_core::ProbeError;
use std::cmp::Ordering;
use std::str::FromStr;

/// A `free` version string, ordered by dotted-version semantics.
///
/// `3.3.10` sorts above `3.3.9`; plain string comparison would get that wrong.
/// Missing components compare as zero, so `3.3` equals `3.3.0`.
#[derive(Debug, Clone)]
pub struct FreeVersion(Vec<u64>);

impl FreeVersion {
    /// Last version that used the legacy `buffers`/`cached` column layout.
    #[must_use]
    pub fn layout_boundary() -> Self {
        Self(vec![3, 3, 9])
    }
}

impl FromStr for FreeVersion {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = Vec::new();
        for part in s.trim().split('.') {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                // Distribution suffixes like "3.3.9ubuntu1" stop the scan;
                // a version with no leading numeric component is unusable.
                break;
            }
            let value = digits
                .parse::<u64>()
                .map_err(|e| ProbeError::parse_with_source(format!("bad version component `{part}`"), e))?;
            components.push(value);
        }

        if components.is_empty() {
            return Err(ProbeError::parse(format!("unparseable free version `{s}`")));
        }

        Ok(Self(components))
    }
}

impl PartialEq for FreeVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FreeVersion {}

impl PartialOrd for FreeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FreeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for idx in 0..len {
            let a = self.0.get(idx).copied().unwrap_or(0);
            let b = other.0.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

/// Column layout of the `Mem:` record, selected once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeLayout {
    /// `[label, total, used, free, shared, cache, available]` (> 3.3.9).
    Modern,
    /// `[label, total, used, free, shared, buffers, cached]` (<= 3.3.9).
    /// Cache is counted as used and has to be subtracted back out.
    Legacy,
}

impl FreeLayout {
    /// Select the layout matching a `free` version.
    #[must_use]
    pub fn for_version(version: &FreeVersion) -> Self {
        if *version > FreeVersion::layout_boundary() {
            Self::Modern
        } else {
            Self::Legacy
        }
    }
}

/// Figures from the `Mem:` record, normalized to the modern layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRecord {
    /// Total physical memory in bytes.
    pub total: u64,
    /// Used physical memory in bytes, cache excluded.
    pub used: u64,
    /// Free physical memory in bytes.
    pub free: u64,
    /// Shared memory in bytes.
    pub shared: u64,
    /// Buffer/cache memory in bytes.
    pub cache: u64,
    /// Available memory as reported by the source, when it reports one.
    pub available: Option<u64>,
}

/// Figures from the `Swap:` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRecord {
    /// Total swap space in bytes.
    pub total: u64,
    /// Used swap space in bytes.
    pub used: u64,
    /// Free swap space in bytes.
    pub free: u64,
}

/// One immutable point-in-time reading of memory and swap accounting.
///
/// All byte figures come straight from the parsed records; the usage
/// percentages are derived once at construction. A snapshot with
/// `total == 0` carries no memory percentage at all rather than a bogus one,
/// and the evaluator turns that into an UNKNOWN result.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySnapshot {
    /// Total physical memory in bytes.
    pub total: u64,
    /// Used physical memory in bytes.
    pub used: u64,
    /// Free physical memory in bytes.
    pub free: u64,
    /// Shared memory in bytes.
    pub shared: u64,
    /// Buffer/cache memory in bytes.
    pub cache: u64,
    /// Available memory in bytes, reported or derived.
    pub available: u64,
    /// Total swap space in bytes.
    pub swap_total: u64,
    /// Used swap space in bytes.
    pub swap_used: u64,
    /// Free swap space in bytes.
    pub swap_free: u64,
    mem_used_percent: Option<f64>,
    swap_used_percent: f64,
}

impl MemorySnapshot {
    /// Build a snapshot from normalized records.
    ///
    /// When the source reported no `available` figure it is derived as
    /// `total - used`, clamped at zero.
    #[must_use]
    pub fn new(mem: MemRecord, swap: SwapRecord) -> Self {
        let available = mem
            .available
            .unwrap_or_else(|| mem.total.saturating_sub(mem.used));

        let mem_used_percent = if mem.total == 0 {
            None
        } else {
            Some((mem.used as f64 / mem.total as f64) * 100.0)
        };

        let swap_used_percent = if swap.total == 0 {
            0.0
        } else {
            (swap.used as f64 / swap.total as f64) * 100.0
        };

        Self {
            total: mem.total,
            used: mem.used,
            free: mem.free,
            shared: mem.shared,
            cache: mem.cache,
            available,
            swap_total: swap.total,
            swap_used: swap.used,
            swap_free: swap.free,
            mem_used_percent,
            swap_used_percent,
        }
    }

    /// Percentage of physical memory in use, `None` when `total` is zero.
    #[must_use]
    pub fn mem_used_percent(&self) -> Option<f64> {
        self.mem_used_percent
    }

    /// Percentage of swap in use. Swap-less hosts read as `0.0`.
    #[must_use]
    pub fn swap_used_percent(&self) -> f64 {
        self.swap_used_percent
    }

    /// Parse a snapshot from captured `free -b` output plus the version string
    /// reported by `free -V`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Parse`] if the version string is unusable, if
    /// either the `Mem:` or `Swap:` record is missing, or if any required
    /// column fails to parse as an integer.
    pub fn from_free_output(output: &str, version: &str) -> Result<Self, ProbeError> {
        let version: FreeVersion = version.parse()?;
        let layout = FreeLayout::for_version(&version);
        tracing::debug!(?layout, "selected free column layout");
        Self::from_free_lines(output.lines(), layout)
    }

    /// Parse a snapshot from `free -b` output lines with a known layout.
    pub fn from_free_lines<'a>(
        lines: impl IntoIterator<Item = &'a str>,
        layout: FreeLayout,
    ) -> Result<Self, ProbeError> {
        let mut mem: Option<MemRecord> = None;
        let mut swap: Option<SwapRecord> = None;

        for line in lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.first() {
                Some(&"Mem:") => mem = Some(parse_mem_record(&tokens, layout)?),
                Some(&"Swap:") => swap = Some(parse_swap_record(&tokens)?),
                _ => {}
            }
        }

        let mem = mem.ok_or_else(|| ProbeError::parse("no Mem: record in free output"))?;
        let swap = swap.ok_or_else(|| ProbeError::parse("no Swap: record in free output"))?;

        Ok(Self::new(mem, swap))
    }
}

fn column(tokens: &[&str], idx: usize, name: &str) -> Result<u64, ProbeError> {
    let raw = tokens
        .get(idx)
        .ok_or_else(|| ProbeError::parse(format!("missing {name} column in free output")))?;
    raw.parse::<u64>()
        .map_err(|e| ProbeError::parse_with_source(format!("bad {name} value `{raw}`"), e))
}

fn parse_mem_record(tokens: &[&str], layout: FreeLayout) -> Result<MemRecord, ProbeError> {
    let total = column(tokens, 1, "total")?;
    let used = column(tokens, 2, "used")?;
    let free = column(tokens, 3, "free")?;
    let shared = column(tokens, 4, "shared")?;

    let record = match layout {
        FreeLayout::Modern => MemRecord {
            total,
            used,
            free,
            shared,
            cache: column(tokens, 5, "buff/cache")?,
            available: Some(column(tokens, 6, "available")?),
        },
        FreeLayout::Legacy => {
            let cache = column(tokens, 5, "buffers")? + column(tokens, 6, "cached")?;
            MemRecord {
                total,
                // legacy free counts cache as used
                used: used.saturating_sub(cache),
                free,
                shared,
                cache,
                available: None,
            }
        }
    };

    Ok(record)
}

fn parse_swap_record(tokens: &[&str]) -> Result<SwapRecord, ProbeError> {
    Ok(SwapRecord {
        total: column(tokens, 1, "swap total")?,
        used: column(tokens, 2, "swap used")?,
        free: column(tokens, 3, "swap free")?,
    })
}
