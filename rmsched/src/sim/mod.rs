/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulation context: analysis gate, tick loop, worker handshake and trace.
//!
//! ```text
//! TaskCatalog ─► HyperperiodCalculator ─► feasibility::analyze ──(U > 1)──► NotSchedulable
//!                                              │ U ≤ 1
//!                                              ▼
//!                         WorkerPool::spawn  (task_count workers)
//!                                              │
//!           ┌──────────── per tick ────────────┤
//!           │ RmScheduler::step ──(overrun)────┼──► terminate all ─► Overrun
//!           │ dispatch / await ack             │
//!           │ Trace::push                      │
//!           └──────────────────────────────────┘
//!                                              ▼
//!                               terminate all, join ─► Trace
//! ```
//!
//! There is no global state.  [`Simulation`] owns the catalog (through the
//! scheduler) and the trace; workers only ever see their own id, name and
//! channel handles.

pub mod handshake;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::hyperperiod::{
    HyperperiodCalculator, HyperperiodError, HyperperiodInfo, DEFAULT_HYPERPERIOD_LIMIT,
};
use crate::scheduler::feasibility::{self, Schedulability};
use crate::scheduler::{RmScheduler, SchedulerError};
use crate::task::TaskCatalog;
use crate::trace::{Trace, TraceEntry};
use handshake::{HandshakeError, WorkerPool, WorkerReport};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Default cap on `hyperperiod × hyperperiod_count`.  The trace is kept in
/// memory until it is committed, one entry per tick.
pub const DEFAULT_TICK_LIMIT: u64 = 10_000_000;

/// Run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Number of hyperperiods to simulate (≥ 1).
    pub hyperperiod_count: u64,
    /// Upper limit on the hyperperiod, in ticks.
    pub hyperperiod_limit: u64,
    /// Upper limit on the total number of simulated ticks.
    pub tick_limit: u64,
}

impl SimConfig {
    pub fn new(hyperperiod_count: u64) -> Self {
        Self {
            hyperperiod_count,
            ..Self::default()
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hyperperiod_count: 1,
            hyperperiod_limit: DEFAULT_HYPERPERIOD_LIMIT,
            tick_limit: DEFAULT_TICK_LIMIT,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Run-level failures, in the order they can occur.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("hyperperiod count must be at least 1")]
    ZeroHyperperiods,

    #[error("invalid hyperperiod: {0}")]
    Hyperperiod(#[from] HyperperiodError),

    #[error("{count} hyperperiod(s) of {hyperperiod} ticks exceed the limit of {limit} ticks")]
    TooManyTicks {
        hyperperiod: u64,
        count: u64,
        limit: u64,
    },

    /// Utilisation above 1, rejected before any worker is spawned.
    #[error("task set is not schedulable: utilization {utilization:.4} exceeds 1")]
    NotSchedulable { utilization: f64 },

    /// The tick loop stopped (overrun); workers were shut down first.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("worker handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
}

impl SimError {
    /// `true` for a deadline overrun detected by the tick loop.
    pub fn is_overrun(&self) -> bool {
        matches!(self, SimError::Scheduler(SchedulerError::Overrun { .. }))
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// A successful run.
#[derive(Debug, Clone)]
pub struct SimOutcome {
    pub trace: Trace,
    pub hyperperiod: HyperperiodInfo,
    pub schedulability: Schedulability,
    pub workers: Vec<WorkerReport>,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// One RM simulation over one catalog.
#[derive(Debug)]
pub struct Simulation {
    catalog: TaskCatalog,
    config: SimConfig,
}

impl Simulation {
    pub fn new(catalog: TaskCatalog, config: SimConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    /// Hyperperiod and utilisation, without running anything.
    ///
    /// # Errors
    /// [`SimError::Hyperperiod`] if the hyperperiod cannot be computed.  An
    /// unschedulable set is **not** an error here; inspect
    /// [`Schedulability::schedulable`].
    pub fn analyze(&self) -> Result<(HyperperiodInfo, Schedulability), SimError> {
        let info = HyperperiodCalculator::with_limit(self.config.hyperperiod_limit)
            .calculate(&self.catalog)?;
        let sched = feasibility::analyze(&self.catalog, info.hyperperiod);
        Ok((info, sched))
    }

    /// Total ticks to simulate for a given hyperperiod.
    ///
    /// # Errors
    /// * [`SimError::ZeroHyperperiods`] – `hyperperiod_count` is zero.
    /// * [`SimError::TooManyTicks`] – the product overflows or exceeds
    ///   `tick_limit`.
    pub fn total_ticks(&self, hyperperiod: u64) -> Result<u64, SimError> {
        let count = self.config.hyperperiod_count;
        if count == 0 {
            return Err(SimError::ZeroHyperperiods);
        }
        let limit = self.config.tick_limit;
        match hyperperiod.checked_mul(count) {
            Some(total) if total <= limit => Ok(total),
            _ => Err(SimError::TooManyTicks {
                hyperperiod,
                count,
                limit,
            }),
        }
    }

    /// Analyse, then simulate `hyperperiod_count` hyperperiods.
    ///
    /// # Errors
    /// See [`run_analyzed`](Self::run_analyzed).
    pub async fn run(self) -> Result<SimOutcome, SimError> {
        if self.config.hyperperiod_count == 0 {
            return Err(SimError::ZeroHyperperiods);
        }
        let (info, schedulability) = self.analyze()?;
        self.run_analyzed(info, schedulability).await
    }

    /// Simulate using a result previously returned by
    /// [`analyze`](Self::analyze), without repeating the analysis.
    ///
    /// # Errors
    /// * [`SimError::ZeroHyperperiods`] / [`SimError::TooManyTicks`] –
    ///   configuration problems; nothing was spawned.
    /// * [`SimError::NotSchedulable`] – utilisation > 1; nothing was spawned.
    /// * [`SimError::Scheduler`] – a deadline was missed mid-run; every worker
    ///   was terminated and joined before returning.
    /// * [`SimError::Handshake`] – a worker misbehaved.
    pub async fn run_analyzed(
        self,
        info: HyperperiodInfo,
        schedulability: Schedulability,
    ) -> Result<SimOutcome, SimError> {
        if !schedulability.schedulable {
            warn!(
                utilization = schedulability.utilization,
                "task set rejected by utilisation test"
            );
            return Err(SimError::NotSchedulable {
                utilization: schedulability.utilization,
            });
        }

        let hyperperiod = info.hyperperiod;
        let total_ticks = self.total_ticks(hyperperiod)?;
        info!(
            tasks = self.catalog.len(),
            hyperperiod,
            repetitions = self.config.hyperperiod_count,
            total_ticks,
            "=== starting RM simulation ==="
        );

        let pool = WorkerPool::spawn(&self.catalog);
        let mut scheduler = RmScheduler::new(self.catalog, hyperperiod);
        let mut trace = Trace::new(hyperperiod);

        let (loop_result, shutdown) = drive(&mut scheduler, pool, &mut trace, total_ticks).await;
        loop_result?;
        let workers = shutdown?;

        info!(ticks = trace.len(), "=== simulation complete ===");
        for w in &workers {
            debug!(task = %w.name, served = w.served, "worker summary");
        }

        Ok(SimOutcome {
            trace,
            hyperperiod: info,
            schedulability,
            workers,
        })
    }
}

/// Run the tick loop, then shut the pool down whatever the loop returned.
///
/// Both results are handed back so the caller decides which error wins.
async fn drive(
    scheduler: &mut RmScheduler,
    mut pool: WorkerPool,
    trace: &mut Trace,
    total_ticks: u64,
) -> (
    Result<(), SimError>,
    Result<Vec<WorkerReport>, HandshakeError>,
) {
    let loop_result = tick_loop(scheduler, &mut pool, trace, total_ticks).await;
    scheduler.finish();
    let shutdown = pool.shutdown().await;
    (loop_result, shutdown)
}

/// Drive `total_ticks` ticks: step, hand the tick to the elected worker, wait
/// for its ack, record.
async fn tick_loop(
    scheduler: &mut RmScheduler,
    pool: &mut WorkerPool,
    trace: &mut Trace,
    total_ticks: u64,
) -> Result<(), SimError> {
    for _ in 0..total_ticks {
        let tick = scheduler.tick();
        match scheduler.step()? {
            Some(id) => {
                let ack = pool.dispatch(id, tick).await?;
                trace.push(TraceEntry::Task(ack.name));
            }
            None => trace.push(TraceEntry::Idle),
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
