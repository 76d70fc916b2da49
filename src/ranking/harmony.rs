//! Harmony scoring.
//!
//! `harmony(v, w) = -Σ w_i · v_i`. A violation of a positively weighted
//! constraint always lowers harmony; the highest-harmony candidate wins.

use crate::error::{HgError, Result};

/// Harmony of one violation vector under a weight vector.
///
/// Fails with [`HgError::DimensionMismatch`] when the lengths differ.
pub fn harmony(violations: &[f64], weights: &[f64]) -> Result<f64> {
    if violations.len() != weights.len() {
        return Err(HgError::DimensionMismatch {
            expected: weights.len(),
            actual: violations.len(),
        });
    }

    Ok(-violations
        .iter()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum::<f64>())
}

/// `a` ranks at or above `b` within the tie tolerance.
pub(crate) fn at_least(a: f64, b: f64, epsilon: f64) -> bool {
    a >= b - epsilon
}
