/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Priority-ordered stack of tasks with an outstanding instance.
//!
//! Stored bottom → top with the highest-priority task (smallest [`TaskId`],
//! i.e. shortest period) at the end of the `Vec`, so `top()` and `pop()` are
//! O(1).  A newly released task is inserted at its priority position with a
//! binary search; a higher-priority release therefore lands above whatever is
//! currently running, which is what realises preemption.

use crate::task::{TaskCatalog, TaskId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyStack {
    /// Strictly decreasing ids from bottom to top.
    slots: Vec<TaskId>,
}

impl ReadyStack {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Insert `id` at its priority position.
    ///
    /// Returns `false` (and leaves the stack unchanged) if `id` is already
    /// present; a task has at most one outstanding instance.
    pub fn push(&mut self, id: TaskId) -> bool {
        // Everything with a larger id has lower priority and stays below
        let pos = self.slots.partition_point(|&p| p > id);
        if self.slots.get(pos) == Some(&id) {
            return false;
        }
        self.slots.insert(pos, id);
        true
    }

    /// Highest-priority outstanding task.
    pub fn top(&self) -> Option<TaskId> {
        self.slots.last().copied()
    }

    pub fn pop(&mut self) -> Option<TaskId> {
        self.slots.pop()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.binary_search_by(|p| id.cmp(p)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Ids from bottom (lowest priority) to top (highest priority).
    pub fn as_slice(&self) -> &[TaskId] {
        &self.slots
    }

    /// Checks the RM ordering against `catalog`: periods never increase from
    /// bottom to top, and no id appears twice.
    pub fn is_priority_sorted(&self, catalog: &TaskCatalog) -> bool {
        let ids_ok = self.slots.windows(2).all(|w| w[0] > w[1]);
        let periods: Option<Vec<u64>> = self
            .slots
            .iter()
            .map(|&id| catalog.get(id).map(|t| t.period))
            .collect();
        let periods_ok = periods.is_some_and(|p| p.windows(2).all(|w| w[0] >= w[1]));
        ids_ok && periods_ok
    }
}
