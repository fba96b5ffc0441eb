// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use overseer_core::{Supervisor, WorkerSpec};
use overseer_daemon::{AppState, build_app};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "overseerd",
    version,
    about = "Supervise a single worker process behind an HTTP control API"
)]
struct Args {
    /// Port for the control API.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Path to the worker executable to supervise.
    executable: PathBuf,

    /// Arguments forwarded verbatim to the worker.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    worker_args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("overseer=debug")
    } else {
        EnvFilter::new("overseer=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.executable.exists() {
        anyhow::bail!(
            "worker executable not found at {}",
            args.executable.display()
        );
    }

    let mut spec = WorkerSpec::new(&args.executable);
    spec.args = args.worker_args;
    let supervisor = Supervisor::new(spec);

    info!(
        executable = %supervisor.spec().command.display(),
        args = ?supervisor.spec().args,
        "supervising worker"
    );

    // Bring the worker up once at boot. A failure here is not fatal: the
    // control API can retry with POST /start.
    if let Err(err) = supervisor.start().await {
        error!(error = %err, "initial worker start failed");
    }

    let state = Arc::new(AppState::new(supervisor));
    let app = build_app(Arc::clone(&state));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "control API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { state.shutdown.notified().await })
        .await
        .context("serve")?;

    info!("supervisor exiting");
    Ok(())
}
