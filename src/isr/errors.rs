//! Errors for the ISR rank model (permutation values, observation
//! constraints, enumeration bounds, sampler preconditions, and options).
//!
//! This module defines the model error type, [`RankError`], and its result
//! alias [`RankResult`], used across the whole `isr` subtree.
//!
//! ## Conventions
//! - **Items and positions are 0-based**; the parser removes any
//!   user-facing offset (`min_modality`) before values reach this layer.
//! - Structural/programmer errors (`InvalidPermutation`, `InvalidPrecision`,
//!   `SizeMismatch`) are returned immediately by the offending call.
//! - Data-driven conditions (`UnsatisfiableConstraints`,
//!   `ConstraintTooLarge`) are recoverable: batch callers can skip the
//!   faulty individual and carry on.
//! - Estimator failures are wrapped as [`RankError::Inference`].
use crate::inference::errors::InferenceError;

/// Crate-wide result alias for ISR operations that may produce [`RankError`].
pub type RankResult<T> = Result<T, RankError>;

/// Unified error type for ISR rank modeling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankError {
    // ---- Permutation values ----
    /// Sequence is not a permutation of `0..n` (wrong length, out of range, or repeated item).
    #[error("Invalid permutation of size {expected}: {values:?}")]
    InvalidPermutation { expected: usize, values: Vec<usize> },

    /// Two rank objects of different sizes were combined.
    #[error("Size mismatch: expected {expected} positions, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    // ---- Observation constraints ----
    /// Candidate set is empty, has fewer than two items, or holds items outside `0..n`.
    #[error("Invalid candidate set at position {position}: {candidates:?}. {reason}")]
    InvalidCandidateSet { position: usize, candidates: Vec<usize>, reason: &'static str },

    /// No permutation satisfies the observation constraints (e.g. contradictory sets).
    #[error("Observation constraints admit no completion.")]
    UnsatisfiableConstraints,

    /// A completed value violates the constraint at `position`.
    #[error("Completed rank violates the observation constraint at position {position}.")]
    InconsistentCompletion { position: usize },

    /// Exhaustive enumeration requested beyond the configured safety bound.
    #[error("Enumeration of more than {bound} values requested (at least {count}).")]
    ConstraintTooLarge { count: usize, bound: usize },

    /// Simulation requested on an individual whose positions are not all missing.
    #[error("Generation requires a fully missing individual.")]
    NotFullyMissing,

    // ---- Model parameters ----
    /// Precision must be finite and lie in [0, 1].
    #[error("Precision must lie in [0, 1]; got {value}.")]
    InvalidPrecision { value: f64 },

    /// Member index outside the individual array.
    #[error("Individual index {index} out of range for {len} individuals.")]
    IndexOutOfRange { index: usize, len: usize },

    /// M-step could not find a central rank with `0 < G < A` comparisons.
    #[error("M-step found no central rank with 0 < G < A after {attempts} sweeps.")]
    DegenerateComparisons { attempts: usize },

    // ---- Options / driver ----
    /// An estimation option is out of its admissible range.
    #[error("Invalid option {name} = {value}. {reason}")]
    InvalidOptions { name: &'static str, value: f64, reason: &'static str },

    /// Estimation driver called in the wrong phase.
    #[error("Operation {operation} is not allowed in phase {phase}.")]
    InvalidPhase { operation: &'static str, phase: &'static str },

    // ---- Estimators ----
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover `Display` payloads and the `InferenceError`
    // conversion. Behavioral error paths are covered next to the code that
    // raises them.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `ConstraintTooLarge` reports both the count and the bound.
    //
    // Given
    // -----
    // - `count = 120`, `bound = 24`.
    //
    // Expect
    // ------
    // - Both numbers appear in the message.
    fn constraint_too_large_message_includes_count_and_bound() {
        // Arrange
        let err = RankError::ConstraintTooLarge { count: 120, bound: 24 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("120") && msg.contains("24"), "Got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Verify that inference errors convert through `?` and keep their text.
    fn inference_errors_lift_into_rank_error() {
        // Arrange
        let inner = InferenceError::InvalidProbability { value: 0.0 };

        // Act
        let err: RankError = inner.clone().into();

        // Assert
        assert_eq!(err, RankError::Inference(inner.clone()));
        assert_eq!(err.to_string(), inner.to_string());
    }
}
