// SPDX-License-Identifier: MIT OR Apache-2.0
//! Worker lifecycle states and the transitions the supervisor enforces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the supervised worker process.
///
/// A record starts in [`ProcessStatus::NotStarted`], moves to
/// [`ProcessStatus::Running`] when a worker is spawned, and settles in
/// [`ProcessStatus::Success`] or [`ProcessStatus::Failed`] when the run ends.
/// Terminal states accept a fresh start, which returns the record to
/// `Running`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// No run has been attempted yet.
    #[default]
    NotStarted,
    /// A worker process is currently alive.
    Running,
    /// The most recent run exited with code zero.
    Success,
    /// The most recent run exited non-zero, died to a signal, or never
    /// spawned at all.
    Failed,
}

impl ProcessStatus {
    /// Returns `true` if a start request is accepted from this state.
    pub fn can_start(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Returns `true` for the terminal states of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_snake_case() {
        let cases = [
            (ProcessStatus::NotStarted, "\"not_started\""),
            (ProcessStatus::Running, "\"running\""),
            (ProcessStatus::Success, "\"success\""),
            (ProcessStatus::Failed, "\"failed\""),
        ];
        for (status, json) in cases {
            assert_eq!(serde_json::to_string(&status).unwrap(), json);
            assert_eq!(serde_json::from_str::<ProcessStatus>(json).unwrap(), status);
        }
    }

    #[test]
    fn display_matches_wire_form() {
        for status in [
            ProcessStatus::NotStarted,
            ProcessStatus::Running,
            ProcessStatus::Success,
            ProcessStatus::Failed,
        ] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{status}\""), wire);
        }
    }

    #[test]
    fn default_is_not_started() {
        assert_eq!(ProcessStatus::default(), ProcessStatus::NotStarted);
    }

    #[test]
    fn only_running_blocks_a_start() {
        assert!(ProcessStatus::NotStarted.can_start());
        assert!(!ProcessStatus::Running.can_start());
        assert!(ProcessStatus::Success.can_start());
        assert!(ProcessStatus::Failed.can_start());
    }

    #[test]
    fn terminal_states() {
        assert!(!ProcessStatus::NotStarted.is_terminal());
        assert!(!ProcessStatus::Running.is_terminal());
        assert!(ProcessStatus::Success.is_terminal());
        assert!(ProcessStatus::Failed.is_terminal());
    }
}
