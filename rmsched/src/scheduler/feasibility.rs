/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedulability analysis.
//!
//! Two utilisation tests are applied before any worker is spawned:
//!
//! * **Necessary test** (the gate): `U = Σ Cᵢ/Tᵢ ≤ 1`.  A task set above 1
//!   cannot fit on one processor under any policy and is rejected outright.
//! * **Liu & Layland (1973)** (a warning): under RM a set of `n` tasks is
//!   guaranteed schedulable if `U ≤ n(2^{1/n} − 1)`.
//!
//! | n | Bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |
//!
//! Between the L&L bound and 1.0 the set **may or may not** be RM-schedulable;
//! the tick loop detects an actual overrun.
//!
//! The necessary test is evaluated exactly.  Over the common denominator `H`
//! (the hyperperiod) each term `Cᵢ/Tᵢ` is the integer `Cᵢ·(H/Tᵢ)`, so
//! `U ≤ 1 ⇔ Σ Cᵢ·(H/Tᵢ) ≤ H` with no truncation and no rounding.

use tracing::{info, warn};

use crate::task::TaskCatalog;

// ── Schedulability ────────────────────────────────────────────────────────────

/// Outcome of the utilisation test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedulability {
    /// Exact numerator of `U` over `denominator`; `u128::MAX` if the sum
    /// overflowed.
    pub numerator: u128,
    /// Common denominator (the hyperperiod).
    pub denominator: u128,
    /// `U` as a float, for diagnostics only.
    pub utilization: f64,
    /// `true` iff `U ≤ 1`.
    pub schedulable: bool,
    /// Liu & Layland bound for this task count.
    pub liu_layland_bound: f64,
}

impl Schedulability {
    /// `true` when `U` passes the necessary test but exceeds the Liu & Layland
    /// bound, i.e. RM may still overrun.
    pub fn exceeds_liu_layland(&self) -> bool {
        self.schedulable && self.utilization > self.liu_layland_bound
    }
}

/// Exact utilisation test over `catalog`, with `hyperperiod` as the common
/// denominator.
///
/// `hyperperiod` must be a common multiple of every period (as returned by
/// [`crate::hyperperiod::HyperperiodCalculator`]).
pub fn analyze(catalog: &TaskCatalog, hyperperiod: u64) -> Schedulability {
    let h = u128::from(hyperperiod);
    // Each term is at most u64::MAX², so only the sum can overflow
    let sum = catalog.tasks().iter().try_fold(0u128, |acc, t| {
        acc.checked_add(u128::from(t.compute) * (h / u128::from(t.period)))
    });
    let (numerator, schedulable) = match sum {
        Some(n) => (n, n <= h),
        None => {
            warn!(denominator = %h, "utilisation numerator overflows u128");
            (u128::MAX, false)
        }
    };

    let utilization = total_utilization(catalog);
    let bound = liu_layland_bound(catalog.len());

    let result = Schedulability {
        numerator,
        denominator: h,
        utilization,
        schedulable,
        liu_layland_bound: bound,
    };

    info!(
        utilization,
        numerator = %numerator,
        denominator = %h,
        schedulable,
        "Utilisation test"
    );
    if result.exceeds_liu_layland() {
        warn!(
            utilization,
            bound,
            task_count = catalog.len(),
            "utilisation exceeds the Liu & Layland bound; RM may still overrun"
        );
    }

    result
}

/// `true` iff the exact utilisation of `catalog` does not exceed 1.
pub fn is_schedulable(catalog: &TaskCatalog, hyperperiod: u64) -> bool {
    analyze(catalog, hyperperiod).schedulable
}

/// Floating-point `Σ Cᵢ/Tᵢ`, each term divided before summing.
pub fn total_utilization(catalog: &TaskCatalog) -> f64 {
    catalog.tasks().iter().map(|t| t.utilization()).sum()
}

/// Liu & Layland utilisation bound for `n` tasks: `n × (2^(1/n) − 1)`.
///
/// Returns `0.0` for `n = 0`.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
