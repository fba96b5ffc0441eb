// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};

#[derive(Parser, Debug)]
#[command(
    name = "overseer-worker",
    version,
    about = "Scripted demo worker for the overseer supervisor"
)]
struct Args {
    /// Number of work steps to report.
    #[arg(long, default_value_t = 5)]
    steps: u32,

    /// Delay after each work step, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Exit code to finish with.
    #[arg(long, default_value_t = 0)]
    exit_code: i32,

    /// Exit with code 1 on SIGTERM instead of dying to the signal.
    #[arg(long)]
    trap_term: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Install the trap before the first line hits stdout, so anyone who has
    // seen output can rely on the handler being live.
    if args.trap_term {
        let mut term = signal(SignalKind::terminate()).context("install SIGTERM handler")?;
        tokio::spawn(async move {
            term.recv().await;
            // The line is best effort; the exit code is the contract even
            // when nobody is reading stdout any more.
            let _ = writeln!(io::stdout(), "stdout: caught SIGTERM, exiting");
            std::process::exit(1);
        });
    }

    println!("stdout: worker started");
    eprintln!("stderr: worker reporting in");

    for step in 1..=args.steps {
        println!("stdout: working... step {step}/{}", args.steps);
        tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
    }

    println!("stdout: worker finished");
    std::process::exit(args.exit_code)
}
