/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hyperperiod calculation.
//!
//! The hyperperiod of a set of periodic tasks is the Least Common Multiple
//! (LCM) of all their periods: the number of ticks after which the release
//! pattern repeats exactly.  The trace is one hyperperiod wide.
//!
//! | Failure | Variant |
//! |---------|---------|
//! | empty catalog | `NoValidPeriods` |
//! | `(a / gcd) * b` overflows `u64` | `Overflow` |
//! | trace would be unusably wide | `TooLarge` |

pub mod math;

use tracing::{debug, info, warn};

use crate::task::TaskCatalog;
use math::{divisible_by_all, lcm_of_slice};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default upper limit on the hyperperiod, in ticks.
///
/// Every tick of the hyperperiod becomes one column of the trace, so anything
/// above this is rejected unless the caller raises the limit.
pub const DEFAULT_HYPERPERIOD_LIMIT: u64 = 1_000_000;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during hyperperiod calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyperperiodError {
    /// The catalog was empty (or every period was zero).
    NoValidPeriods,

    /// LCM calculation overflowed `u64`.
    Overflow { a: u64, b: u64 },

    /// The calculated hyperperiod exceeded the configured limit.
    TooLarge { value: u64, limit: u64 },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::NoValidPeriods => {
                write!(f, "no tasks with a valid (non-zero) period")
            }
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}, {b})")
            }
            HyperperiodError::TooLarge { value, limit } => write!(
                f,
                "hyperperiod of {value} ticks exceeds the limit of {limit} ticks"
            ),
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── HyperperiodInfo ───────────────────────────────────────────────────────────

/// Calculated hyperperiod for one task catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperperiodInfo {
    /// Hyperperiod in ticks (LCM of all unique task periods).
    pub hyperperiod: u64,

    /// Unique periods present in the catalog (sorted, deduplicated).
    pub unique_periods: Vec<u64>,

    /// Number of tasks that contributed to this hyperperiod.
    pub task_count: usize,
}

// ── HyperperiodCalculator ─────────────────────────────────────────────────────

/// Computes hyperperiods subject to an upper limit.
///
/// # Example
/// ```rust
/// use rmsched::hyperperiod::HyperperiodCalculator;
/// use rmsched::task::{TaskCatalog, TaskSpec};
///
/// let catalog = TaskCatalog::new(vec![
///     TaskSpec::new("A", 2, 6),
///     TaskSpec::new("B", 3, 12),
///     TaskSpec::new("C", 6, 24),
/// ])
/// .unwrap();
///
/// let info = HyperperiodCalculator::new().calculate(&catalog).unwrap();
/// assert_eq!(info.hyperperiod, 24);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HyperperiodCalculator {
    /// A calculated value above this limit yields [`HyperperiodError::TooLarge`].
    limit: u64,
}

impl HyperperiodCalculator {
    /// Calculator with [`DEFAULT_HYPERPERIOD_LIMIT`].
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_HYPERPERIOD_LIMIT,
        }
    }

    /// Calculator with a custom limit (in ticks).
    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Calculate the hyperperiod of `catalog`.
    ///
    /// # Errors
    /// * [`HyperperiodError::NoValidPeriods`] – the catalog has no tasks.
    /// * [`HyperperiodError::Overflow`] – LCM computation exceeded `u64`.
    /// * [`HyperperiodError::TooLarge`] – result exceeds the configured limit.
    pub fn calculate(&self, catalog: &TaskCatalog) -> Result<HyperperiodInfo, HyperperiodError> {
        let periods: Vec<u64> = catalog
            .tasks()
            .iter()
            .map(|t| t.period)
            .filter(|&p| p > 0)
            .collect();

        if periods.is_empty() {
            warn!("No tasks with valid periods found in the task set");
            return Err(HyperperiodError::NoValidPeriods);
        }

        let unique_periods: Vec<u64> = {
            let mut v = periods.clone();
            v.sort_unstable();
            v.dedup();
            v
        };

        let hyperperiod = lcm_of_slice(&unique_periods)?;
        debug_assert!(divisible_by_all(hyperperiod, &unique_periods));

        if hyperperiod > self.limit {
            warn!(
                hyperperiod,
                limit = self.limit,
                "Hyperperiod exceeds configured limit"
            );
            return Err(HyperperiodError::TooLarge {
                value: hyperperiod,
                limit: self.limit,
            });
        }

        info!(
            task_count = periods.len(),
            unique_count = unique_periods.len(),
            hyperperiod,
            "Calculated hyperperiod"
        );
        for p in &unique_periods {
            debug!(period = p, "  unique period");
        }

        Ok(HyperperiodInfo {
            hyperperiod,
            unique_periods,
            task_count: periods.len(),
        })
    }
}

impl Default for HyperperiodCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Hyperperiod of `catalog` with the default limit.
pub fn compute_hyperperiod(catalog: &TaskCatalog) -> Result<u64, HyperperiodError> {
    HyperperiodCalculator::new()
        .calculate(catalog)
        .map(|info| info.hyperperiod)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSpec;

    fn catalog(periods: &[u64]) -> TaskCatalog {
        let specs = periods
            .iter()
            .enumerate()
            .map(|(i, &p)| TaskSpec::new(format!("t{i}"), 1, p))
            .collect();
        TaskCatalog::new(specs).unwrap()
    }

    #[test]
    fn harmonic_periods_hyperperiod_is_largest() {
        assert_eq!(compute_hyperperiod(&catalog(&[6, 12, 24])).unwrap(), 24);
    }

    #[test]
    fn non_harmonic_periods_hyperperiod_is_lcm() {
        // LCM(4, 6, 10) = 60
        assert_eq!(compute_hyperperiod(&catalog(&[4, 6, 10])).unwrap(), 60);
    }

    #[test]
    fn single_task_hyperperiod_is_its_period() {
        assert_eq!(compute_hyperperiod(&catalog(&[7])).unwrap(), 7);
    }

    #[test]
    fn unique_periods_are_sorted_and_deduped() {
        let info = HyperperiodCalculator::new()
            .calculate(&catalog(&[5, 1, 5, 2]))
            .unwrap();
        assert_eq!(info.unique_periods, vec![1, 2, 5]);
        assert_eq!(info.task_count, 4);
        assert_eq!(info.hyperperiod, 10);
    }

    #[test]
    fn hyperperiod_exceeding_limit_returns_too_large_error() {
        let result = HyperperiodCalculator::with_limit(50).calculate(&catalog(&[7, 11]));
        assert_eq!(
            result.unwrap_err(),
            HyperperiodError::TooLarge {
                value: 77,
                limit: 50
            }
        );
    }

    #[test]
    fn hyperperiod_at_exactly_the_limit_is_accepted() {
        let info = HyperperiodCalculator::with_limit(77)
            .calculate(&catalog(&[7, 11]))
            .unwrap();
        assert_eq!(info.hyperperiod, 77);
    }

    #[test]
    fn overflowing_periods_return_overflow_error() {
        let huge = u64::MAX / 2 + 1;
        let result = HyperperiodCalculator::with_limit(u64::MAX).calculate(&catalog(&[huge, huge - 1]));
        assert!(matches!(result, Err(HyperperiodError::Overflow { .. })));
    }
}
