/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Release/acknowledge handshake between the tick loop and the task workers.
//!
//! One worker unit (a `tokio` task) runs per catalog entry.  Each worker owns a
//! capacity-1 release channel; all workers share one capacity-1 acknowledgment
//! channel whose receiver belongs to the scheduler:
//!
//! ```text
//!  scheduler                    worker[id]
//!     │── Release::Run{tick} ──────►│
//!     │                             │ contributes its name
//!     │◄──────── Ack{id,name,tick} ─│
//!     │  (next tick)                │ waits again
//!     ⋮                             ⋮
//!     │── Release::Terminate ──────►│ exits without work
//! ```
//!
//! The scheduler never sends a second release before the matching ack has
//! arrived, so at most one worker is active at any instant and trace entries
//! are totally ordered.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::task::{TaskCatalog, TaskId};

// ── Messages ──────────────────────────────────────────────────────────────────

/// Message on a worker's release channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Perform the work for `tick`, then acknowledge.
    Run { tick: u64 },
    /// Exit without doing any work.
    Terminate,
}

/// Acknowledgment sent by a worker after its turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub task: TaskId,
    pub name: Arc<str>,
    pub tick: u64,
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// No worker exists for the given id.
    #[error("no worker registered for task {0}")]
    UnknownTask(TaskId),

    /// The worker's release channel is closed (it exited early).
    #[error("worker for task {task} is gone (release channel closed at tick {tick})")]
    WorkerGone { task: TaskId, tick: u64 },

    /// Every worker dropped its ack sender.
    #[error("acknowledgment channel closed while waiting for task {task} at tick {tick}")]
    AckChannelClosed { task: TaskId, tick: u64 },

    /// An ack arrived from a different task or for a different tick.
    #[error("out-of-order acknowledgment: expected task {expected} tick {tick}, got task {got} tick {got_tick}")]
    OutOfOrder {
        expected: TaskId,
        tick: u64,
        got: TaskId,
        got_tick: u64,
    },

    /// A worker task panicked or was cancelled.
    #[error("worker for task {task} failed to join: {reason}")]
    Join { task: TaskId, reason: String },
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// The narrow view a worker gets: its own id and name plus channel handles.
struct Worker {
    id: TaskId,
    name: Arc<str>,
    release_rx: mpsc::Receiver<Release>,
    ack_tx: mpsc::Sender<Ack>,
}

impl Worker {
    /// Serve releases until told to terminate.  Returns the number of ticks
    /// served.
    async fn run(mut self) -> u64 {
        let mut served = 0u64;

        while let Some(msg) = self.release_rx.recv().await {
            match msg {
                Release::Terminate => {
                    trace!(task = %self.name, "terminate received");
                    break;
                }
                Release::Run { tick } => {
                    let ack = Ack {
                        task: self.id,
                        name: Arc::clone(&self.name),
                        tick,
                    };
                    if self.ack_tx.send(ack).await.is_err() {
                        warn!(task = %self.name, tick, "scheduler went away, worker exiting");
                        break;
                    }
                    served += 1;
                }
            }
        }

        debug!(task = %self.name, served, "worker exited");
        served
    }
}

// ── WorkerPool ────────────────────────────────────────────────────────────────

/// Ticks served by each worker, reported at shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub task: TaskId,
    pub name: Arc<str>,
    pub served: u64,
}

/// The fixed set of worker units for one run plus the scheduler's side of
/// every channel.
pub struct WorkerPool {
    releases: Vec<mpsc::Sender<Release>>,
    names: Vec<Arc<str>>,
    ack_rx: mpsc::Receiver<Ack>,
    handles: Vec<JoinHandle<u64>>,
}

impl WorkerPool {
    /// Spawn one worker per task in `catalog`.
    ///
    /// Must be called from within a `tokio` runtime.
    pub fn spawn(catalog: &TaskCatalog) -> Self {
        let (ack_tx, ack_rx) = mpsc::channel::<Ack>(1);

        let mut releases = Vec::with_capacity(catalog.len());
        let mut names = Vec::with_capacity(catalog.len());
        let mut handles = Vec::with_capacity(catalog.len());

        for (id, task) in catalog.iter() {
            let (release_tx, release_rx) = mpsc::channel::<Release>(1);
            let worker = Worker {
                id,
                name: Arc::clone(&task.name),
                release_rx,
                ack_tx: ack_tx.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
            releases.push(release_tx);
            names.push(Arc::clone(&task.name));
        }

        debug!(workers = handles.len(), "worker pool spawned");

        Self {
            releases,
            names,
            ack_rx,
            handles,
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Hand tick `tick` to worker `task` and wait for its acknowledgment.
    ///
    /// # Errors
    /// Any [`HandshakeError`]; the pool should then be shut down.
    pub async fn dispatch(&mut self, task: TaskId, tick: u64) -> Result<Ack, HandshakeError> {
        let tx = self
            .releases
            .get(task.index())
            .ok_or(HandshakeError::UnknownTask(task))?;

        tx.send(Release::Run { tick })
            .await
            .map_err(|_| HandshakeError::WorkerGone { task, tick })?;

        let ack = self
            .ack_rx
            .recv()
            .await
            .ok_or(HandshakeError::AckChannelClosed { task, tick })?;

        if ack.task != task || ack.tick != tick {
            return Err(HandshakeError::OutOfOrder {
                expected: task,
                tick,
                got: ack.task,
                got_tick: ack.tick,
            });
        }

        Ok(ack)
    }

    /// Broadcast [`Release::Terminate`] to every worker and join them all.
    ///
    /// A worker that has already exited is skipped for the broadcast but
    /// still joined.  Returns per-worker service counts in catalog order.
    pub async fn shutdown(self) -> Result<Vec<WorkerReport>, HandshakeError> {
        let WorkerPool {
            releases,
            names,
            ack_rx,
            handles,
        } = self;

        for (index, tx) in releases.iter().enumerate() {
            if tx.send(Release::Terminate).await.is_err() {
                debug!(task = %names[index], "worker already exited before terminate");
            }
        }
        // Releasing the senders also unblocks any worker the broadcast missed
        drop(releases);
        drop(ack_rx);

        let mut reports = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            let task = TaskId(index);
            let served = handle.await.map_err(|e| HandshakeError::Join {
                task,
                reason: e.to_string(),
            })?;
            reports.push(WorkerReport {
                task,
                name: Arc::clone(&names[index]),
                served,
            });
        }

        debug!(workers = reports.len(), "worker pool joined");
        Ok(reports)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
