/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use rmsched::hyperperiod::DEFAULT_HYPERPERIOD_LIMIT;
use rmsched::sim::{SimConfig, SimError, Simulation, DEFAULT_TICK_LIMIT};
use rmsched::taskset::{self, TaskSetFormat};
use rmsched::trace::TraceArtifact;

// ── Exit codes ────────────────────────────────────────────────────────────────

/// Process exit codes.  `2` is reserved for clap usage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Success = 0,
    Config = 1,
    NotSchedulable = 3,
    Overrun = 4,
    Internal = 5,
}

impl Exit {
    fn from_sim_error(err: &SimError) -> Self {
        match err {
            SimError::NotSchedulable { .. } => Exit::NotSchedulable,
            e if e.is_overrun() => Exit::Overrun,
            SimError::Handshake(_) | SimError::Scheduler(_) => Exit::Internal,
            SimError::ZeroHyperperiods | SimError::Hyperperiod(_) | SimError::TooManyTicks { .. } => {
                Exit::Config
            }
        }
    }
}

// ── CLI argument definition ───────────────────────────────────────────────────

/// Rate-monotonic scheduler simulator.
///
/// Example:
///   rmsched 2 tasks.txt schedule.trace
#[derive(Debug, Parser)]
#[command(
    name = "rmsched",
    about = "Rate-monotonic scheduler simulator – writes a tick-by-tick trace",
    long_about = None,
)]
struct Cli {
    /// Number of hyperperiods to simulate (≥ 1).
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    hyperperiods: u64,

    /// Task-set file (`name compute period` per line, or YAML).
    task_set: PathBuf,

    /// Output trace file.  Removed again if the run fails.
    trace: PathBuf,

    /// Reject task sets whose hyperperiod exceeds this many ticks.
    #[arg(long = "max-hyperperiod", default_value_t = DEFAULT_HYPERPERIOD_LIMIT)]
    max_hyperperiod: u64,

    /// Reject runs longer than this many ticks in total.
    #[arg(long = "max-ticks", default_value_t = DEFAULT_TICK_LIMIT)]
    max_ticks: u64,

    /// Task-set file format.
    #[arg(long, value_enum, default_value_t = TaskSetFormat::Auto)]
    format: TaskSetFormat,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    // Logs go to stderr; stdout carries only the final summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!(
        hyperperiods    = cli.hyperperiods,
        task_set        = %cli.task_set.display(),
        trace           = %cli.trace.display(),
        max_hyperperiod = cli.max_hyperperiod,
        max_ticks       = cli.max_ticks,
        format          = ?cli.format,
        "Configuration"
    );

    let code = run(cli).await;
    process::exit(code as i32);
}

async fn run(cli: Cli) -> Exit {
    // ── Load task set ─────────────────────────────────────────────────────────
    let catalog = match taskset::load_catalog(&cli.task_set, cli.format) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load task set: {:#}", e);
            return Exit::Config;
        }
    };

    let config = SimConfig {
        hyperperiod_count: cli.hyperperiods,
        hyperperiod_limit: cli.max_hyperperiod,
        tick_limit: cli.max_ticks,
    };
    let sim = Simulation::new(catalog, config);

    // ── Analysis gate (no file is touched on rejection) ───────────────────────
    let (info, sched) = match sim.analyze() {
        Ok(r) => r,
        Err(e) => {
            error!("{:#}", e);
            return Exit::from_sim_error(&e);
        }
    };
    if !sched.schedulable {
        error!(
            utilization = sched.utilization,
            "This task set is not schedulable (utilization {:.4} > 1)", sched.utilization
        );
        return Exit::NotSchedulable;
    }
    if let Err(e) = sim.total_ticks(info.hyperperiod) {
        error!("{:#}", e);
        return Exit::from_sim_error(&e);
    }

    // ── Trace artifact ────────────────────────────────────────────────────────
    let artifact = match TraceArtifact::create(&cli.trace) {
        Ok(a) => a,
        Err(e) => {
            error!("{:#}", e);
            return Exit::Config;
        }
    };

    // ── Simulate ──────────────────────────────────────────────────────────────
    let hyperperiod = info.hyperperiod;
    let outcome = match sim.run_analyzed(info, sched).await {
        Ok(o) => o,
        Err(e) => {
            // Dropping the artifact removes the partial file
            drop(artifact);
            error!("Simulation failed: {:#}", e);
            return Exit::from_sim_error(&e);
        }
    };

    if let Err(e) = artifact.commit(&outcome.trace) {
        error!("{:#}", e);
        return Exit::Config;
    }

    println!(
        "schedulable: U = {:.4}, hyperperiod = {}, {} tick(s) written to {}",
        sched.utilization,
        hyperperiod,
        outcome.trace.len(),
        cli.trace.display()
    );
    Exit::Success
}
