// SPDX-License-Identifier: MIT OR Apache-2.0
//! Spawn configuration for the supervised worker.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Immutable description of how to launch the worker process.
///
/// The spec is fixed when the [`Supervisor`](crate::Supervisor) is built;
/// every run of the worker uses the same command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerSpec {
    /// Path to the worker executable.
    pub command: PathBuf,
    /// Arguments passed to the worker, in order.
    pub args: Vec<String>,
    /// Extra environment variables layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Working directory for the worker. Inherits the supervisor's when
    /// `None`.
    pub cwd: Option<PathBuf>,
}

impl WorkerSpec {
    /// Create a spec for `command` with no arguments, no extra environment,
    /// and an inherited working directory.
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_spec_has_empty_defaults() {
        let spec = WorkerSpec::new("/usr/bin/true");
        assert_eq!(spec.command, PathBuf::from("/usr/bin/true"));
        assert!(spec.args.is_empty());
        assert!(spec.env.is_empty());
        assert!(spec.cwd.is_none());
    }

    #[test]
    fn fields_are_plain_data() {
        let mut spec = WorkerSpec::new("worker");
        spec.args = vec!["--steps".into(), "3".into()];
        spec.env.insert("RUST_LOG".into(), "debug".into());
        spec.cwd = Some(PathBuf::from("/tmp"));

        let copy = spec.clone();
        assert_eq!(copy, spec);
        assert_eq!(copy.args, ["--steps", "3"]);
    }
}
