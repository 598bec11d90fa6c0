use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// A failed probe run. Every variant names the stage that failed.
#[derive(Debug)]
pub enum ProbeError {
    /// The probe program templates could not be rendered.
    Render(askama::Error),
    /// Writing the probe program failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The probe process could not be started.
    Launch {
        program: String,
        source: std::io::Error,
    },
    /// The probe did not finish in time and was killed.
    Timeout { after: Duration, stderr: String },
    /// The probe exited unsuccessfully (this includes compile failures).
    Exit { status: ExitStatus, stderr: String },
    /// The probe output is not a JSON array of records.
    Decode {
        source: serde_json::Error,
        stderr: String,
    },
    /// A decoded record is missing a required value.
    Protocol { index: usize, reason: String },
    /// An output stream of the probe could not be drained.
    Drain { stream: &'static str },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\n--- probe stderr (tail) ---\n{}", stderr.trim_end())
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Render(e) => write!(f, "probe template render failed: {e}"),
            ProbeError::Io { path, source } => {
                write!(f, "probe file I/O failed at {}: {source}", path.display())
            }
            ProbeError::Launch { program, source } => {
                write!(f, "probe launch failed ({program}): {source}")
            }
            ProbeError::Timeout { after, stderr } => write!(
                f,
                "probe timed out after {}s and was killed{}",
                after.as_secs(),
                stderr_suffix(stderr)
            ),
            ProbeError::Exit { status, stderr } => {
                write!(f, "probe exited with {status}{}", stderr_suffix(stderr))
            }
            ProbeError::Decode { source, stderr } => write!(
                f,
                "probe output decode failed: {source}{}",
                stderr_suffix(stderr)
            ),
            ProbeError::Protocol { index, reason } => {
                write!(f, "probe protocol violation in record {index}: {reason}")
            }
            ProbeError::Drain { stream } => {
                write!(f, "probe {stream} could not be drained")
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Render(e) => Some(e),
            ProbeError::Io { source, .. } | ProbeError::Launch { source, .. } => Some(source),
            ProbeError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}
