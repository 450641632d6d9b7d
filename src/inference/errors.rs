//! Error handling for posterior summaries and likelihood estimators.
//!
//! This module defines `InferenceError`, the error type shared by the
//! harmonic-mean marginal likelihood estimator and the parameter statistics
//! accumulators. An alias `InferenceResult<T>` standardizes the return type
//! across inference code. ISR model code lifts these errors into
//! [`RankError::Inference`](crate::isr::errors::RankError::Inference).

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    // ---- Harmonic-mean estimator ----
    /// A reciprocal-likelihood observation must lie in (0, 1].
    #[error("Inference Error: probability must lie in (0, 1]; got {value}")]
    InvalidProbability { value: f64 },

    /// A harmonic-mean cell was requested before any sample was recorded.
    #[error("Inference Error: no samples recorded for individual {individual}, class {class}")]
    InsufficientSamples { individual: usize, class: usize },

    /// Individual or class index outside the estimator dimensions.
    #[error("Inference Error: index {index} out of range for {what} of size {len}")]
    IndexOutOfRange { what: &'static str, index: usize, len: usize },

    // ---- Parameter statistics ----
    /// `finalize` was called on an accumulator that never recorded a sample.
    #[error("Inference Error: cannot summarize an empty sample")]
    EmptyAccumulator,

    /// Confidence level must lie strictly inside (0, 1).
    #[error("Inference Error: confidence level must lie in (0, 1); got {value}")]
    InvalidConfidenceLevel { value: f64 },
}

pub type InferenceResult<T> = Result<T, InferenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Offending payloads appear in the rendered messages.
    fn inference_error_messages_embed_payloads() {
        let msg = InferenceError::InvalidProbability { value: 1.5 }.to_string();
        assert!(msg.contains("1.5"), "Got: {msg}");

        let msg = InferenceError::InsufficientSamples { individual: 7, class: 2 }.to_string();
        assert!(msg.contains('7') && msg.contains('2'), "Got: {msg}");
    }
}
