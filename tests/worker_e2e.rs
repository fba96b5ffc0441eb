// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior checks for the demo worker binary, including its signal
//! handling.

use assert_cmd::Command;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use predicates::prelude::*;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ChildStdout, Command as StdCommand, Stdio};

fn worker() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("overseer-worker").expect("binary `overseer-worker` should be built")
}

/// Spawn a long-running worker and wait for its first stdout line, which is
/// only printed once signal handling is set up. The returned reader holds
/// the read end of the worker's stdout pipe; keep it alive until the worker
/// has been waited on.
fn spawn_long_worker(extra_args: &[&str]) -> (Child, BufReader<ChildStdout>) {
    #[allow(deprecated)]
    let path = assert_cmd::cargo::cargo_bin("overseer-worker");
    let mut child = StdCommand::new(path)
        .args(["--steps", "100000", "--interval-ms", "50"])
        .args(extra_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn overseer-worker");

    let stdout = child.stdout.take().expect("worker stdout is piped");
    let mut reader = BufReader::new(stdout);
    let mut first = String::new();
    reader.read_line(&mut first).expect("read worker stdout");
    assert!(first.contains("worker started"), "unexpected line {first:?}");

    (child, reader)
}

#[test]
fn scripted_run_reports_steps_and_exits_cleanly() {
    worker()
        .args(["--steps", "2", "--interval-ms", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("worker started"))
        .stdout(predicate::str::contains("step 1/2"))
        .stdout(predicate::str::contains("step 2/2"))
        .stdout(predicate::str::contains("worker finished"))
        .stderr(predicate::str::contains("worker reporting in"));
}

#[test]
fn exit_code_flag_is_honored() {
    worker()
        .args(["--steps", "0", "--exit-code", "3"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn trapped_sigterm_exits_with_code_one() {
    let (mut child, mut reader) = spawn_long_worker(&["--trap-term"]);

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).expect("deliver SIGTERM");
    let status = child.wait().expect("wait for worker");

    assert_eq!(status.code(), Some(1));

    // The trap announced itself before exiting.
    let mut rest = String::new();
    reader.read_to_string(&mut rest).expect("drain worker stdout");
    assert!(rest.contains("caught SIGTERM"), "missing trap line in {rest:?}");
}

#[test]
fn untrapped_worker_dies_to_the_signal() {
    let (mut child, _reader) = spawn_long_worker(&[]);

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).expect("deliver SIGTERM");
    let status = child.wait().expect("wait for worker");

    assert!(!status.success());
    assert_eq!(status.code(), None);
    assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
}
