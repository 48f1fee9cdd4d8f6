//! # Numeric Kernel
//!
//! The level loop queries `log2(n + 1)` for small `n` extremely often, and
//! sums the results over up to one term per input symbol. This module keeps
//! both operations cheap and stable: a precomputed table serves the small
//! arguments, and a compensated summator keeps the running total from
//! drifting in its low-order bits on large inputs.

use once_cell::sync::Lazy;

/// Number of entries in the precomputed `log2` table.
const LOG2_TABLE_SIZE: usize = 512;

/// Process-wide `log2` table for arguments below [`LOG2_TABLE_SIZE`].
///
/// Entry 0 holds positive infinity; it is addressable but no caller consumes
/// it, since copy factors are always at least 1. The table is read-only
/// after initialisation and safe to share between independent engine
/// instances on separate threads.
static LOG2_TABLE: Lazy<[f64; LOG2_TABLE_SIZE]> = Lazy::new(|| {
    let mut table = [f64::INFINITY; LOG2_TABLE_SIZE];
    for (n, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = (n as f64).log2();
    }
    table
});

/// `log2(n)` with a table fast path.
///
/// Arguments below 512 are read from [`LOG2_TABLE`]; larger arguments fall
/// back to the platform `log2`, so both paths carry full `f64` precision.
#[inline]
pub fn log2_fast(n: u64) -> f64 {
    if n < LOG2_TABLE_SIZE as u64 {
        LOG2_TABLE[n as usize]
    } else {
        (n as f64).log2()
    }
}

/// A running sum of `f64` terms with a Kahan correction term.
///
/// Plain accumulation of millions of small logarithm terms corrupts the
/// low-order bits of the total, and that error propagates into every
/// quantity derived from it. The correction term recovers what each
/// addition rounds away.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    /// A sum starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `x`, folding the rounding error into the correction term.
    #[inline]
    pub fn add(&mut self, x: f64) {
        let y = x - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// The accumulated value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_exact_powers() {
        assert_eq!(log2_fast(1), 0.0);
        assert_eq!(log2_fast(2), 1.0);
        assert_eq!(log2_fast(4), 2.0);
        assert_eq!(log2_fast(256), 8.0);
        assert_eq!(log2_fast(512), 9.0);
        assert_eq!(log2_fast(1 << 20), 20.0);
    }

    #[test]
    fn test_log2_zero_is_infinite() {
        assert!(log2_fast(0).is_infinite());
        assert!(log2_fast(0) > 0.0);
    }

    #[test]
    fn test_log2_table_matches_fallback() {
        // The table path and the platform path must agree bit-for-bit on
        // every representable argument near the crossover.
        for n in 1..2048u64 {
            assert_eq!(log2_fast(n), (n as f64).log2(), "n = {n}");
        }
    }

    #[test]
    fn test_compensated_sum_tracks_reference() {
        let x = (3.0f64).log2();
        let count = 100_000;

        let mut compensated = CompensatedSum::new();
        let mut naive = 0.0f64;
        for _ in 0..count {
            compensated.add(x);
            naive += x;
        }

        // A single multiplication rounds once and serves as the reference.
        let reference = count as f64 * x;

        let comp_err = (compensated.value() - reference).abs();
        let naive_err = (naive - reference).abs();
        assert!(comp_err <= naive_err);
        assert!(comp_err / reference < 1e-12);
    }

    #[test]
    fn test_compensated_sum_default_is_zero() {
        assert_eq!(CompensatedSum::new().value(), 0.0);
    }
}
