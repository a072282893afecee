/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core task data structures for the rate-monotonic simulator.
//!
//! Two types model the two sides of catalog construction:
//!
//! ```text
//! task-set file  ──(loader)──►  TaskSpec  ──(TaskCatalog::new)──►  Task
//!                                ↑ input                            ↑ priority-ordered,
//!                                declaration order                   per-instance counter
//! ```
//!
//! # Ownership model
//! The [`TaskCatalog`] is **owned** by the scheduler for the duration of one
//! simulation run.  Its structure never changes after construction; the only
//! mutable field is [`Task::remaining`], and only the scheduler touches it.
//! Worker units receive a cheap `Arc<str>` clone of their task's name and
//! nothing else.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::trace::IDLE_MARKER;

// ── TaskId ────────────────────────────────────────────────────────────────────

/// Index of a task inside a [`TaskCatalog`].
///
/// The catalog is sorted by RM priority, so comparing two ids compares their
/// priorities: a **smaller** id is a **higher** priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── TaskSpec (input) ──────────────────────────────────────────────────────────

/// One task record as declared in a task-set file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
    /// Compute-time `C` in ticks.
    pub compute: u64,
    /// Period `T` in ticks.
    pub period: u64,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, compute: u64, period: u64) -> Self {
        Self {
            name: name.into(),
            compute,
            period,
        }
    }
}

// ── Task (working copy) ───────────────────────────────────────────────────────

/// A periodic task plus the per-instance remaining-time counter.
///
/// Invariant: `0 ≤ remaining ≤ compute`, and `remaining > 0` only while an
/// instance is outstanding.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique name within the task set.  Shared with the task's worker.
    pub name: Arc<str>,

    /// Compute-time `C` in ticks (always > 0).
    pub compute: u64,

    /// Period `T` in ticks (always > 0).
    pub period: u64,

    /// Compute-time still owed by the current instance.
    pub remaining: u64,
}

impl Task {
    /// Utilisation fraction `C / T`.
    pub fn utilization(&self) -> f64 {
        self.compute as f64 / self.period as f64
    }

    /// Returns `true` while the current instance has compute-time outstanding.
    pub fn is_outstanding(&self) -> bool {
        self.remaining > 0
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Reasons a list of [`TaskSpec`]s cannot become a [`TaskCatalog`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("task set is empty: at least one task is required")]
    Empty,

    #[error("task '{name}' has zero compute-time")]
    ZeroCompute { name: String },

    #[error("task '{name}' has zero period")]
    ZeroPeriod { name: String },

    #[error("task name '{name}' is declared more than once")]
    DuplicateName { name: String },

    /// Names become single trace tokens, so they must be non-empty, free of
    /// whitespace and control characters, and distinct from the idle marker.
    #[error("task name {name:?} is not a valid trace token")]
    InvalidName { name: String },
}

// ── TaskCatalog ───────────────────────────────────────────────────────────────

/// Priority-ordered sequence of tasks.
///
/// Sorted by ascending period (shorter period ⇒ higher RM priority).  The
/// sort is stable, so tasks sharing a period keep their declaration order and
/// the first-declared one wins the tie.
#[derive(Debug, Clone)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
}

impl TaskCatalog {
    /// Validate `specs` and build the catalog.
    ///
    /// # Errors
    /// * [`CatalogError::Empty`] – no tasks.
    /// * [`CatalogError::ZeroCompute`] / [`CatalogError::ZeroPeriod`] – a
    ///   timing parameter is not positive.
    /// * [`CatalogError::DuplicateName`] – two tasks share a name.
    /// * [`CatalogError::InvalidName`] – a name cannot be written as one
    ///   trace token.
    pub fn new(specs: Vec<TaskSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if !is_valid_name(&spec.name) {
                return Err(CatalogError::InvalidName {
                    name: spec.name.clone(),
                });
            }
            if spec.compute == 0 {
                return Err(CatalogError::ZeroCompute {
                    name: spec.name.clone(),
                });
            }
            if spec.period == 0 {
                return Err(CatalogError::ZeroPeriod {
                    name: spec.name.clone(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: spec.name.clone(),
                });
            }
        }

        let mut tasks: Vec<Task> = specs
            .into_iter()
            .map(|s| Task {
                name: Arc::from(s.name),
                compute: s.compute,
                period: s.period,
                remaining: 0,
            })
            .collect();
        // Stable: equal periods keep declaration order
        tasks.sort_by_key(|t| t.period);

        Ok(Self { tasks })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id.index())
    }

    /// Tasks in priority order (highest first).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// `(id, task)` pairs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().enumerate().map(|(i, t)| (TaskId(i), t))
    }

    /// Look a task up by name.
    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .position(|t| &*t.name == name)
            .map(TaskId)
    }

    /// Reset every remaining-time counter to zero.
    pub fn reset(&mut self) {
        for t in &mut self.tasks {
            t.remaining = 0;
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != IDLE_MARKER
        && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
