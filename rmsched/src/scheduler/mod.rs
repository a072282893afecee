/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rate-monotonic tick loop.
//!
//! [`RmScheduler`] owns the [`TaskCatalog`] (and with it every task's
//! remaining-time counter) plus the [`ReadyStack`].  Each call to
//! [`RmScheduler::step`] simulates one tick:
//!
//! 1. **Release** – every task whose period divides `t mod hyperperiod` gets a
//!    new instance.  A task whose previous instance is still outstanding is a
//!    deadline overrun and halts the scheduler.
//! 2. **Reorder** – released tasks are inserted at their priority position.
//! 3. **Elect** – the top of the stack runs; an empty stack is an idle tick.
//! 4. **Service** – the elected task's remaining time drops by one; it is
//!    popped when it reaches zero.
//! 5. **Emit** – the elected id (or `None`) is returned to the caller.
//!
//! The scheduler is purely synchronous and deterministic; the worker handshake
//! lives in [`crate::sim`].
//!
//! ```text
//!          step() elects          step() finds empty stack
//!   Idle ───────────────► Running(id) ─────────────────────► Idle
//!    │                        │
//!    └──── finish() / overrun ┴──────────────► Halted(reason)
//! ```

pub mod error;
pub mod feasibility;
pub mod ready_stack;

pub use error::SchedulerError;
pub use ready_stack::ReadyStack;

use tracing::{debug, error, trace};

use crate::task::{TaskCatalog, TaskId};

// ── State ─────────────────────────────────────────────────────────────────────

/// Why the scheduler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The requested number of ticks was simulated.
    Completed,
    /// A task overran its deadline.
    Overrun,
}

/// Scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedState {
    /// No task holds the processor.
    #[default]
    Idle,
    /// Exactly one task was serviced during the last tick.
    Running(TaskId),
    /// Terminal.
    Halted(HaltReason),
}

impl SchedState {
    pub fn is_halted(&self) -> bool {
        matches!(self, SchedState::Halted(_))
    }
}

// ── RmScheduler ───────────────────────────────────────────────────────────────

/// Fixed-priority preemptive RM scheduler over one task catalog.
#[derive(Debug)]
pub struct RmScheduler {
    catalog: TaskCatalog,
    stack: ReadyStack,
    hyperperiod: u64,
    /// Next tick to simulate; keeps counting across hyperperiod repetitions.
    tick: u64,
    state: SchedState,
}

impl RmScheduler {
    /// Create a scheduler at tick 0 in state `Idle`.
    ///
    /// `hyperperiod` must be a common multiple of every period in `catalog`.
    /// All remaining-time counters are reset.
    pub fn new(mut catalog: TaskCatalog, hyperperiod: u64) -> Self {
        catalog.reset();
        let stack = ReadyStack::with_capacity(catalog.len());
        Self {
            catalog,
            stack,
            hyperperiod,
            tick: 0,
            state: SchedState::Idle,
        }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn ready_stack(&self) -> &ReadyStack {
        &self.stack
    }

    pub fn hyperperiod(&self) -> u64 {
        self.hyperperiod
    }

    /// The next tick [`step`](Self::step) will simulate.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> SchedState {
        self.state
    }

    /// Simulate one tick and return the elected task, or `None` if idle.
    ///
    /// # Errors
    /// * [`SchedulerError::Overrun`] – a release found the previous instance
    ///   unfinished.  The scheduler transitions to `Halted(Overrun)`.
    /// * [`SchedulerError::Halted`] – the scheduler had already halted.
    pub fn step(&mut self) -> Result<Option<TaskId>, SchedulerError> {
        if self.state.is_halted() {
            return Err(SchedulerError::Halted);
        }

        let t = self.tick;
        self.release(t)?;

        let elected = self.stack.top();
        match elected {
            Some(id) => {
                self.service(id);
                self.state = SchedState::Running(id);
            }
            None => {
                trace!(tick = t, "idle");
                self.state = SchedState::Idle;
            }
        }

        self.tick += 1;
        Ok(elected)
    }

    /// Mark the run as completed.  Further `step()` calls fail.
    pub fn finish(&mut self) {
        if !self.state.is_halted() {
            self.state = SchedState::Halted(HaltReason::Completed);
        }
    }

    // ── Per-tick phases ───────────────────────────────────────────────────────

    fn release(&mut self, t: u64) -> Result<(), SchedulerError> {
        let phase = t % self.hyperperiod;

        for index in 0..self.catalog.len() {
            let id = TaskId(index);
            let Some(task) = self.catalog.get_mut(id) else {
                continue;
            };
            if phase % task.period != 0 {
                continue;
            }

            if task.is_outstanding() {
                let err = SchedulerError::Overrun {
                    task: task.name.to_string(),
                    tick: t,
                    remaining: task.remaining,
                };
                error!(
                    task = %task.name,
                    tick = t,
                    remaining = task.remaining,
                    period = task.period,
                    "deadline overrun"
                );
                self.state = SchedState::Halted(HaltReason::Overrun);
                return Err(err);
            }

            task.remaining = task.compute;
            self.stack.push(id);
            debug!(tick = t, task = %task.name, compute = task.compute, "released");
        }

        debug_assert!(self.stack.is_priority_sorted(&self.catalog));
        Ok(())
    }

    fn service(&mut self, id: TaskId) {
        let Some(task) = self.catalog.get_mut(id) else {
            return;
        };
        task.remaining = task.remaining.saturating_sub(1);
        trace!(tick = self.tick, task = %task.name, remaining = task.remaining, "serviced");

        if task.remaining == 0 {
            // The elected task is always the top
            self.stack.pop();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperperiod::compute_hyperperiod;
    use crate::task::TaskSpec;

    fn scheduler(list: &[(&str, u64, u64)]) -> RmScheduler {
        let cat = TaskCatalog::new(
            list.iter()
                .map(|&(n, c, t)| TaskSpec::new(n, c, t))
                .collect(),
        )
        .unwrap();
        let h = compute_hyperperiod(&cat).unwrap();
        RmScheduler::new(cat, h)
    }

    /// Run `ticks` steps and render each as a name or `__`.
    fn run(s: &mut RmScheduler, ticks: u64) -> Result<Vec<String>, SchedulerError> {
        let mut out = Vec::new();
        for _ in 0..ticks {
            let name = match s.step()? {
                Some(id) => s.catalog().get(id).unwrap().name.to_string(),
                None => "__".to_string(),
            };
            out.push(name);
        }
        Ok(out)
    }

    #[test]
    fn classic_harmonic_set_follows_rm_order() {
        let mut s = scheduler(&[("C", 6, 24), ("A", 2, 6), ("B", 3, 12)]);
        let row = run(&mut s, 24).unwrap().join(" ");
        assert_eq!(
            row,
            "A A B B B C A A C C C C A A B B B C A A __ __ __ __"
        );
    }

    #[test]
    fn tick_zero_releases_everything_shortest_period_on_top() {
        let mut s = scheduler(&[("slow", 1, 20), ("fast", 1, 5), ("mid", 1, 10)]);
        let elected = s.step().unwrap().unwrap();
        assert_eq!(&*s.catalog().get(elected).unwrap().name, "fast");
        // fast finished in one tick; mid is now on top of slow
        let remaining: Vec<&str> = s
            .ready_stack()
            .as_slice()
            .iter()
            .map(|&id| &*s.catalog().get(id).unwrap().name)
            .collect();
        assert_eq!(remaining, vec!["slow", "mid"]);
    }

    #[test]
    fn higher_priority_release_preempts_running_task() {
        // B runs from tick 2; A is released at tick 4 and takes over
        let mut s = scheduler(&[("A", 1, 4), ("B", 5, 20)]);
        let row = run(&mut s, 8).unwrap();
        assert_eq!(row, vec!["A", "B", "B", "B", "A", "B", "B", "__"]);
    }

    #[test]
    fn overrun_is_fatal_and_halts() {
        // U = 2/4 + 3/6 = 1.0, yet B misses its deadline at tick 6
        let mut s = scheduler(&[("A", 2, 4), ("B", 3, 6)]);
        let err = run(&mut s, 12).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Overrun {
                task: "B".to_string(),
                tick: 6,
                remaining: 1,
            }
        );
        assert_eq!(s.state(), SchedState::Halted(HaltReason::Overrun));
        assert_eq!(s.step().unwrap_err(), SchedulerError::Halted);
    }

    #[test]
    fn remaining_never_exceeds_compute() {
        let mut s = scheduler(&[("A", 2, 6), ("B", 3, 12), ("C", 6, 24)]);
        for _ in 0..48 {
            s.step().unwrap();
            for t in s.catalog().tasks() {
                assert!(t.remaining <= t.compute);
            }
        }
    }

    #[test]
    fn ready_stack_stays_priority_sorted_every_tick() {
        let mut s = scheduler(&[("A", 1, 3), ("B", 2, 5), ("C", 1, 15), ("D", 2, 30)]);
        for _ in 0..60 {
            s.step().unwrap();
            assert!(s.ready_stack().is_priority_sorted(s.catalog()));
        }
    }

    #[test]
    fn tick_counter_continues_across_hyperperiods() {
        let mut s = scheduler(&[("A", 1, 2)]);
        let row = run(&mut s, 6).unwrap();
        assert_eq!(row, vec!["A", "__", "A", "__", "A", "__"]);
        assert_eq!(s.tick(), 6);
    }

    #[test]
    fn compute_equal_to_period_never_idles() {
        let mut s = scheduler(&[("busy", 4, 4)]);
        let row = run(&mut s, 8).unwrap();
        assert!(row.iter().all(|n| n == "busy"));
    }

    #[test]
    fn equal_periods_first_declared_wins() {
        let mut s = scheduler(&[("first", 1, 4), ("second", 1, 4)]);
        let row = run(&mut s, 4).unwrap();
        assert_eq!(row, vec!["first", "second", "__", "__"]);
    }

    #[test]
    fn finish_halts_as_completed() {
        let mut s = scheduler(&[("A", 1, 2)]);
        s.step().unwrap();
        assert_eq!(s.state(), SchedState::Running(TaskId(0)));
        s.step().unwrap();
        assert_eq!(s.state(), SchedState::Idle);
        s.finish();
        assert_eq!(s.state(), SchedState::Halted(HaltReason::Completed));
        assert!(matches!(s.step(), Err(SchedulerError::Halted)));
    }
}
