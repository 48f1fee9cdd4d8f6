//! # Derived Metrics
//!
//! Conversions from the accumulated complexity to the derived quantities.
//! Complexity itself is always carried in log2 units; the information and
//! entropy values are "raw" until scaled by a [`Unit`], which divides by
//! `ln 2` for bits and leaves nats untouched. Complexity is never
//! rescaled.

use std::f64::consts::LN_2;

/// The unit information and entropy values are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Binary digits (the default).
    #[default]
    Bits,
    /// Natural units.
    Nats,
}

impl Unit {
    /// The divisor applied to raw information and entropy values.
    pub fn scale(self) -> f64 {
        match self {
            Unit::Bits => LN_2,
            Unit::Nats => 1.0,
        }
    }

    /// Scales a raw information or entropy value into this unit.
    pub fn apply(self, raw: f64) -> f64 {
        raw / self.scale()
    }
}

/// Raw T-information for a complexity value: `2^C - 1`.
#[inline]
pub fn t_information(complexity: f64) -> f64 {
    complexity.exp2() - 1.0
}

/// Raw average T-entropy rate at a level.
///
/// Divides the information accumulated so far by the effective length from
/// the pattern start to the end of the input, widened by the symbols the
/// level collapsed beyond one pattern copy.
#[inline]
pub fn average_entropy(
    information: f64,
    input_len: usize,
    cp_start: usize,
    cp_length: usize,
    joined_length: usize,
) -> f64 {
    let effective = (input_len - cp_start) + (joined_length - cp_length) + 1;
    information / effective as f64
}

/// Raw instantaneous T-entropy rate at a level: information gained per
/// symbol collapsed.
#[inline]
pub fn instantaneous_entropy(information: f64, previous: f64, joined_length: usize) -> f64 {
    (information - previous) / joined_length as f64
}
