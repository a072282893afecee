/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the rate-monotonic tick loop.
//!
//! Every variant carries enough data (task name, tick, outstanding time) to
//! emit a fully-qualified `tracing` event and to print a precise diagnostic
//! from the binary without further parsing.

use thiserror::Error;

/// Errors returned by [`RmScheduler::step()`](super::RmScheduler::step).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A task's previous instance still owed compute-time when its next
    /// release was due.  The run is halted; the trace must be discarded.
    #[error(
        "deadline overrun: task '{task}' still owed {remaining} tick(s) when released again at tick {tick}"
    )]
    Overrun {
        task: String,
        tick: u64,
        remaining: u64,
    },

    /// `step()` was called after the scheduler reached `Halted`.
    #[error("scheduler is halted, no further ticks can be simulated")]
    Halted,
}
