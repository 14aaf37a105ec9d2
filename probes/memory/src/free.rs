//! Subprocess plumbing for the `free` utility.
//!
//! One probe run makes exactly two calls: `free -V` for the version banner
//! (the column layout depends on it) and `free -b` for the byte-unit report.

use memprobe_rs_core::ProbeError;
use std::process::Command;

/// Name of the memory-reporting binary.
pub const FREE_BINARY: &str = "free";

/// Raw output captured from one pair of `free` invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeOutput {
    /// Version string extracted from the `free -V` banner, e.g. `3.3.10`.
    pub version: String,
    /// Full stdout of `free -b`.
    pub report: String,
}

/// Run `free -V` and `free -b` and capture both outputs.
///
/// # Errors
///
/// Returns [`ProbeError::Command`] if either invocation fails to spawn or
/// exits unsuccessfully, and [`ProbeError::Parse`] if the version banner is
/// empty or the output is not UTF-8.
pub fn collect() -> Result<FreeOutput, ProbeError> {
    let banner = run(&["-V"])?;
    let version = version_from_banner(&banner)?;
    tracing::info!(version, "detected free version");

    let report = run(&["-b"])?;

    Ok(FreeOutput { version, report })
}

/// Check that the `free` binary is present and answers a version query.
///
/// # Errors
///
/// Returns [`ProbeError::Unavailable`] when the binary cannot be run.
pub fn check_available() -> Result<(), ProbeError> {
    run(&["-V"])
        .map(|_| ())
        .map_err(|e| ProbeError::unavailable(format!("`{FREE_BINARY}` is not usable: {e}")))
}

fn run(args: &[&str]) -> Result<String, ProbeError> {
    let command = format!("{FREE_BINARY} {}", args.join(" "));

    let output = Command::new(FREE_BINARY)
        .args(args)
        .output()
        .map_err(|e| ProbeError::command(&command, e.to_string()))?;

    if !output.status.success() {
        return Err(ProbeError::command(
            &command,
            format!("exited with {}", output.status),
        ));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| ProbeError::parse_with_source(format!("`{command}` produced non-UTF-8 output"), e))
}

/// Extract the version token from a `free -V` banner.
///
/// The banner looks like `free from procps-ng 3.3.10`; the version is the
/// last whitespace-separated token of the first line.
pub fn version_from_banner(banner: &str) -> Result<String, ProbeError> {
    banner
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_owned)
        .ok_or_else(|| ProbeError::parse("empty version banner from free -V"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_banner() {
        let version = version_from_banner("free from procps-ng 3.3.10\n").unwrap();
        assert_eq!(version, "3.3.10");

        let version = version_from_banner("free from procps-ng 4.0.4").unwrap();
        assert_eq!(version, "4.0.4");
    }

    #[test]
    fn test_version_from_banner_uses_first_line_only() {
        let version = version_from_banner("free from procps-ng 3.3.9\nextra noise 9.9.9\n").unwrap();
        assert_eq!(version, "3.3.9");
    }

    #[test]
    fn test_version_from_empty_banner() {
        assert!(version_from_banner("").is_err());
        assert!(version_from_banner("\n").is_err());
    }
}
