//! Assistant-creation progress reporting.
//!
//! Relays the backend's streamed progress records to the terminal while
//! `dc assistants create` runs. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

use crate::models::{CreateProgress, ProgressStatus};

/// Reports creation progress. Implementations write to stderr (human or JSON).
pub trait CreateProgressReporter: Send + Sync {
    /// Emit one progress record, in arrival order.
    fn report(&self, record: &CreateProgress);
}

/// Human-friendly progress on stderr: "create  processing  40%  Chunking document...".
pub struct StderrProgress;

impl CreateProgressReporter for StderrProgress {
    fn report(&self, record: &CreateProgress) {
        let status = match record.status {
            ProgressStatus::Uploading => "uploading",
            ProgressStatus::Processing => "processing",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Error => "error",
        };
        let line = match record.progress {
            Some(pct) => format!("create  {}  {:.0}%  {}\n", status, pct, record.message),
            None => format!("create  {}  {}\n", status, record.message),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr, in the
/// same shape the backend streams.
pub struct JsonProgress;

impl CreateProgressReporter for JsonProgress {
    fn report(&self, record: &CreateProgress) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl CreateProgressReporter for NoProgress {
    fn report(&self, _record: &CreateProgress) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller passes it to the creation call.
    pub fn reporter(&self) -> Box<dyn CreateProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl std::str::FromStr for ProgressMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!("Unknown progress mode: '{}'. Must be off, human, or json.", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses() {
        assert_eq!("off".parse::<ProgressMode>().unwrap(), ProgressMode::Off);
        assert_eq!("human".parse::<ProgressMode>().unwrap(), ProgressMode::Human);
        assert_eq!("json".parse::<ProgressMode>().unwrap(), ProgressMode::Json);
        assert!("verbose".parse::<ProgressMode>().is_err());
    }
}
