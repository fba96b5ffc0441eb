// SPDX-License-Identifier: MIT OR Apache-2.0
//! Supervision of a single worker process: spawn, signal, observe.

use std::io;
use std::process::Stdio;
use std::sync::Arc;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::spec::WorkerSpec;
use crate::status::ProcessStatus;

/// Errors produced by [`Supervisor`] operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A start was requested while a worker run is in flight.
    #[error("worker is already running")]
    AlreadyRunning,

    /// A stop was requested with no worker run in flight.
    #[error("worker is not running")]
    NotRunning,

    /// The operating system failed to create the worker process.
    #[error("failed to spawn worker: {0}")]
    Spawn(#[source] io::Error),

    /// SIGTERM could not be delivered to the running worker.
    #[error("failed to signal worker: {0}")]
    Signal(#[source] nix::Error),
}

/// Mutable state for the current, or most recent, worker run.
///
/// `generation` counts starts. Reaper and pump tasks capture the generation
/// they were spawned for and leave the record alone if a newer run has taken
/// it over.
#[derive(Debug, Default)]
struct ProcessRecord {
    status: ProcessStatus,
    pid: Option<u32>,
    generation: u64,
    output: Vec<u8>,
}

/// Supervises a single worker process.
///
/// The supervisor owns one process record behind an async mutex. Every
/// operation takes the lock, so status reads, log snapshots, and state
/// transitions are serialized. The worker's exit is observed by a detached
/// reaper task that commits the terminal status; `stop` only delivers
/// SIGTERM and returns.
#[derive(Clone, Debug)]
pub struct Supervisor {
    spec: Arc<WorkerSpec>,
    record: Arc<Mutex<ProcessRecord>>,
}

impl Supervisor {
    /// Create a supervisor for `spec` with an empty record in
    /// [`ProcessStatus::NotStarted`].
    pub fn new(spec: WorkerSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            record: Arc::new(Mutex::new(ProcessRecord::default())),
        }
    }

    /// The spawn configuration this supervisor was built with.
    pub fn spec(&self) -> &WorkerSpec {
        &self.spec
    }

    /// Launch the worker and return its PID.
    ///
    /// Rejected with [`SupervisorError::AlreadyRunning`] while a run is in
    /// flight. On acceptance the previous run's log is discarded, the worker
    /// is spawned with stdout and stderr piped into the combined log, and a
    /// reaper task is left behind to record how the run ends. A spawn
    /// failure leaves the record in [`ProcessStatus::Failed`].
    pub async fn start(&self) -> Result<u32, SupervisorError> {
        let mut record = self.record.lock().await;
        if !record.status.can_start() {
            return Err(SupervisorError::AlreadyRunning);
        }

        record.output.clear();
        record.generation += 1;
        let generation = record.generation;

        let mut cmd = Command::new(&self.spec.command);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.spec.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.spec.env {
            cmd.env(k, v);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                record.status = ProcessStatus::Failed;
                warn!(
                    target: "overseer.supervisor",
                    command = %self.spec.command.display(),
                    error = %err,
                    "worker failed to spawn"
                );
                return Err(SupervisorError::Spawn(err));
            }
        };

        let Some(pid) = child.id() else {
            // id() is only None once the child has been reaped, which
            // cannot have happened yet. Treat it as a failed spawn.
            let _ = child.start_kill();
            record.status = ProcessStatus::Failed;
            return Err(SupervisorError::Spawn(io::Error::other(
                "worker pid unavailable after spawn",
            )));
        };

        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(
                Arc::clone(&self.record),
                stdout,
                generation,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(
                Arc::clone(&self.record),
                stderr,
                generation,
            )));
        }

        record.status = ProcessStatus::Running;
        record.pid = Some(pid);
        drop(record);

        info!(
            target: "overseer.supervisor",
            pid,
            command = %self.spec.command.display(),
            "worker started"
        );

        tokio::spawn(reap(Arc::clone(&self.record), child, generation, pumps));

        Ok(pid)
    }

    /// Request a graceful shutdown of the running worker.
    ///
    /// Delivers SIGTERM and returns without waiting for the exit; the reaper
    /// observes the resulting exit and performs the terminal transition.
    /// Rejected with [`SupervisorError::NotRunning`] when no run is in
    /// flight.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let record = self.record.lock().await;
        let pid = match (record.status, record.pid) {
            (ProcessStatus::Running, Some(pid)) => pid,
            _ => return Err(SupervisorError::NotRunning),
        };

        kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(SupervisorError::Signal)?;
        info!(target: "overseer.supervisor", pid, "sent SIGTERM to worker");
        Ok(())
    }

    /// Current status of the worker record.
    pub async fn status(&self) -> ProcessStatus {
        self.record.lock().await.status
    }

    /// PID of the live worker. `None` unless a run is in flight.
    pub async fn pid(&self) -> Option<u32> {
        self.record.lock().await.pid
    }

    /// Snapshot of the combined stdout and stderr captured for the current,
    /// or most recent, run.
    pub async fn logs(&self) -> Vec<u8> {
        self.record.lock().await.output.clone()
    }
}

/// Copy one child stream into the combined log, mirroring each chunk to the
/// supervisor's own stdout, until EOF or until a newer run takes the record
/// over.
async fn pump<R>(record: Arc<Mutex<ProcessRecord>>, mut stream: R, generation: u64)
where
    R: AsyncRead + Unpin,
{
    let mut mirror = tokio::io::stdout();
    let mut buf = [0u8; 8192];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        {
            let mut record = record.lock().await;
            if record.generation != generation {
                break;
            }
            record.output.extend_from_slice(&buf[..n]);
        }

        // Mirroring is best effort; the captured log is the source of truth.
        let _ = mirror.write_all(&buf[..n]).await;
        let _ = mirror.flush().await;
    }
}

/// Wait for the child to exit, drain its output pumps, then commit the
/// terminal status.
///
/// The child handle is owned by value, so the reaper can only ever wait on
/// the run it was spawned for. The generation check keeps a stale reaper
/// from touching a record that a newer run has since claimed.
async fn reap(
    record: Arc<Mutex<ProcessRecord>>,
    mut child: Child,
    generation: u64,
    pumps: Vec<JoinHandle<()>>,
) {
    let outcome = child.wait().await;

    // Both pipes reach EOF once the child is gone; joining the pumps here
    // means the log is complete before the terminal status becomes visible.
    for pump in pumps {
        let _ = pump.await;
    }

    let mut record = record.lock().await;
    if record.generation != generation {
        debug!(target: "overseer.supervisor", generation, "stale reaper left record alone");
        return;
    }

    record.pid = None;
    record.status = match outcome {
        Ok(status) if status.success() => {
            info!(target: "overseer.supervisor", "worker exited successfully");
            ProcessStatus::Success
        }
        Ok(status) => {
            warn!(
                target: "overseer.supervisor",
                code = ?status.code(),
                "worker exited with failure"
            );
            ProcessStatus::Failed
        }
        Err(err) => {
            error!(target: "overseer.supervisor", error = %err, "wait on worker failed");
            ProcessStatus::Failed
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_rejection() {
        assert_eq!(
            SupervisorError::AlreadyRunning.to_string(),
            "worker is already running"
        );
        assert_eq!(
            SupervisorError::NotRunning.to_string(),
            "worker is not running"
        );
    }

    #[test]
    fn spawn_error_carries_the_cause() {
        let err = SupervisorError::Spawn(io::Error::other("boom"));
        let msg = err.to_string();
        assert!(msg.contains("failed to spawn worker"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn fresh_record_defaults() {
        let record = ProcessRecord::default();
        assert_eq!(record.status, ProcessStatus::NotStarted);
        assert!(record.pid.is_none());
        assert_eq!(record.generation, 0);
        assert!(record.output.is_empty());
    }

    #[test]
    fn supervisor_exposes_the_spec_it_was_built_with() {
        let mut spec = WorkerSpec::new("/bin/echo");
        spec.args = vec!["hello".into()];

        let supervisor = Supervisor::new(spec.clone());
        assert_eq!(supervisor.spec(), &spec);
    }
}
