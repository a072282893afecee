/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic helpers: GCD and checked LCM.
//!
//! These are free functions rather than methods so they can be used and tested
//! independently of the catalog.

use super::HyperperiodError;

/// Iterative Euclidean GCD.  `gcd(0, x) == x`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM: returns `Err(HyperperiodError::Overflow { a, b })` if the
/// result would overflow `u64`.
///
/// Divides before multiplying (`(a / gcd) * b`); the multiplication is still
/// checked.  Returns `Ok(0)` when either input is `0`.
pub fn lcm(a: u64, b: u64) -> Result<u64, HyperperiodError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }

    let reduced = a / gcd(a, b);

    reduced
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// Reduce a slice of periods to their overall LCM.
///
/// Returns `Ok(0)` for an empty slice and `Err` on the first overflow.
pub fn lcm_of_slice(periods: &[u64]) -> Result<u64, HyperperiodError> {
    periods
        .iter()
        .try_fold(periods.first().copied().unwrap_or(0), |acc, &p| lcm(acc, p))
}

/// Returns `true` if every period divides `candidate` with zero remainder.
pub fn divisible_by_all(candidate: u64, periods: &[u64]) -> bool {
    periods.iter().all(|&p| p != 0 && candidate % p == 0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Brute-force reference: smallest candidate ≥ max(periods) divisible by
    /// every period.
    fn reference_lcm(periods: &[u64]) -> u64 {
        let mut candidate = periods.iter().copied().max().unwrap_or(0);
        while !divisible_by_all(candidate, periods) {
            candidate += 1;
        }
        candidate
    }

    #[test]
    fn gcd_basic_cases() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(7, 3), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(42, 42), 42);
    }

    #[test]
    fn lcm_basic_cases() {
        assert_eq!(lcm(4, 6).unwrap(), 12);
        assert_eq!(lcm(3, 5).unwrap(), 15);
        assert_eq!(lcm(0, 5).unwrap(), 0);
    }

    #[test]
    fn lcm_overflow_returns_error() {
        let a = u64::MAX / 2 + 1;
        let b = u64::MAX / 2 + 3;
        assert!(matches!(lcm(a, b), Err(HyperperiodError::Overflow { .. })));
    }

    #[test]
    fn lcm_of_slice_harmonic_periods() {
        assert_eq!(lcm_of_slice(&[6, 12, 24]).unwrap(), 24);
    }

    #[test]
    fn lcm_of_slice_empty_returns_zero() {
        assert_eq!(lcm_of_slice(&[]).unwrap(), 0);
    }

    #[test]
    fn lcm_of_slice_matches_incremental_search() {
        let sets: &[&[u64]] = &[
            &[6, 12, 24],
            &[4, 6],
            &[3, 5, 7],
            &[10, 15, 20, 25],
            &[1],
            &[9, 9, 9],
            &[2, 3, 4, 5, 6],
        ];
        for set in sets {
            assert_eq!(
                lcm_of_slice(set).unwrap(),
                reference_lcm(set),
                "mismatch for {set:?}"
            );
        }
    }

    #[test]
    fn divisible_by_all_checks_every_period() {
        assert!(divisible_by_all(24, &[6, 12, 24]));
        assert!(!divisible_by_all(18, &[6, 12]));
        assert!(!divisible_by_all(10, &[0]));
    }
}
