//! ISR validation helpers — scalar and size guards shared by the model code.
//!
//! Purpose
//! -------
//! Centralize the small checks every ISR operation performs at its
//! boundary: precision in [0, 1], matching rank sizes, member indices inside
//! the data, and option ranges. Callers fail fast with structured
//! [`RankError`] values instead of propagating NaN through log-probabilities.
//!
//! Conventions
//! -----------
//! - Helpers return the validated value (or `()`) and never panic.
//! - This module performs no logging.
use crate::isr::{
    core::permutation::RankVal,
    errors::{RankError, RankResult},
};

/// Validate an ISR precision parameter.
///
/// Parameters
/// ----------
/// - `precision`: `f64`
///   Probability that one comparison agrees with the central rank.
///
/// Returns
/// -------
/// `RankResult<f64>`
///   - `Ok(precision)` if it is finite and lies in `[0, 1]`.
///   - `Err(RankError::InvalidPrecision)` otherwise.
pub fn validate_precision(precision: f64) -> RankResult<f64> {
    if !precision.is_finite() || !(0.0..=1.0).contains(&precision) {
        return Err(RankError::InvalidPrecision { value: precision });
    }
    Ok(precision)
}

/// Validate that a central rank has the expected number of positions.
///
/// # Errors
/// - [`RankError::SizeMismatch`] if `central_rank.len() != n`.
pub fn validate_rank_size(central_rank: &RankVal, n: usize) -> RankResult<()> {
    if central_rank.len() != n {
        return Err(RankError::SizeMismatch { expected: n, actual: central_rank.len() });
    }
    Ok(())
}

/// Validate a `(central_rank, precision)` pair against an individual of size `n`.
pub fn validate_model_params(central_rank: &RankVal, precision: f64, n: usize) -> RankResult<()> {
    validate_precision(precision)?;
    validate_rank_size(central_rank, n)
}

/// Validate that `index` addresses one of `len` individuals.
pub fn validate_index(index: usize, len: usize) -> RankResult<usize> {
    if index >= len {
        return Err(RankError::IndexOutOfRange { index, len });
    }
    Ok(index)
}

/// Validate a confidence level used by the posterior summaries.
///
/// # Errors
/// - [`RankError::InvalidOptions`] unless `0 < level < 1`.
pub fn validate_confidence_level(level: f64) -> RankResult<f64> {
    if !level.is_finite() || level <= 0.0 || level >= 1.0 {
        return Err(RankError::InvalidOptions {
            name: "confidence_level",
            value: level,
            reason: "Confidence level must lie strictly inside (0, 1).",
        });
    }
    Ok(level)
}

/// Validate a count option that must be at least `min`.
pub fn validate_count(name: &'static str, value: usize, min: usize) -> RankResult<usize> {
    if value < min {
        return Err(RankError::InvalidOptions {
            name,
            value: value as f64,
            reason: "Count option is below its minimum.",
        });
    }
    Ok(value)
}

/// `n!` as `usize`, or `None` on overflow.
pub fn checked_factorial(n: usize) -> Option<usize> {
    (2..=n).try_fold(1usize, |acc, k| acc.checked_mul(k))
}
