//! Harmonic-mean marginal likelihood estimator.
//!
//! Purpose
//! -------
//! Estimate per-(individual, class) observed log-likelihoods when exact
//! enumeration of completions is infeasible. During the Gibbs run, each
//! sweep contributes one completed probability `p_s` per cell; the estimate
//! is the log of the harmonic mean,
//!
//! `ln L̂ = −ln((1/m) Σ_s 1/p_s)`.
//!
//! Conventions
//! -----------
//! - Samples are stored as `−ln p_s` and reduced with a max-shifted
//!   log-mean-exp, so very small probabilities neither underflow nor
//!   overflow their reciprocals.
//! - Individuals index rows, classes index columns.
use ndarray::Array2;

use crate::{
    inference::errors::{InferenceError, InferenceResult},
    numerical_stability::log_mean_exp,
};

/// Per-cell samples of reciprocal completed probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicMeanEstimator {
    nb_individuals: usize,
    nb_classes: usize,
    /// Row-major cells; each holds `−ln p_s` for the recorded samples.
    neg_log_samples: Vec<Vec<f64>>,
}

impl HarmonicMeanEstimator {
    pub fn new(nb_individuals: usize, nb_classes: usize) -> HarmonicMeanEstimator {
        HarmonicMeanEstimator {
            nb_individuals,
            nb_classes,
            neg_log_samples: vec![Vec::new(); nb_individuals * nb_classes],
        }
    }

    pub fn nb_individuals(&self) -> usize {
        self.nb_individuals
    }

    pub fn nb_classes(&self) -> usize {
        self.nb_classes
    }

    /// Record one probability sample for cell `(individual, class)`.
    ///
    /// # Errors
    /// - [`InferenceError::InvalidProbability`] unless `0 < probability <= 1`.
    /// - [`InferenceError::IndexOutOfRange`] for an index outside the grid.
    pub fn observe(&mut self, individual: usize, class: usize, probability: f64) -> InferenceResult<()> {
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(InferenceError::InvalidProbability { value: probability });
        }
        self.observe_log(individual, class, probability.ln())
    }

    /// Record one sample given as a log-probability in `(−∞, 0]`.
    ///
    /// # Errors
    /// - [`InferenceError::InvalidProbability`] (reporting `exp(log_probability)`)
    ///   when the log-probability is NaN, `−∞` or positive.
    pub fn observe_log(&mut self, individual: usize, class: usize, log_probability: f64) -> InferenceResult<()> {
        if !(log_probability.is_finite() && log_probability <= 0.0) {
            return Err(InferenceError::InvalidProbability { value: log_probability.exp() });
        }
        let cell = self.cell_index(individual, class)?;
        self.neg_log_samples[cell].push(-log_probability);
        Ok(())
    }

    /// Number of samples recorded in a cell.
    pub fn nb_samples(&self, individual: usize, class: usize) -> InferenceResult<usize> {
        let cell = self.cell_index(individual, class)?;
        Ok(self.neg_log_samples[cell].len())
    }

    /// Harmonic-mean log-likelihood estimate of one cell.
    ///
    /// # Errors
    /// - [`InferenceError::InsufficientSamples`] for an empty cell.
    pub fn log_likelihood(&self, individual: usize, class: usize) -> InferenceResult<f64> {
        let cell = self.cell_index(individual, class)?;
        let samples = &self.neg_log_samples[cell];
        if samples.is_empty() {
            return Err(InferenceError::InsufficientSamples { individual, class });
        }
        Ok(-log_mean_exp(samples))
    }

    /// Estimates for every cell; empty cells are `NaN`.
    pub fn harmonic_mean_log_likelihood(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.nb_individuals, self.nb_classes), |(i, k)| {
            let samples = &self.neg_log_samples[i * self.nb_classes + k];
            if samples.is_empty() { f64::NAN } else { -log_mean_exp(samples) }
        })
    }

    /// Drop every recorded sample, keeping the dimensions.
    pub fn clear(&mut self) {
        self.neg_log_samples.iter_mut().for_each(Vec::clear);
    }

    fn cell_index(&self, individual: usize, class: usize) -> InferenceResult<usize> {
        if individual >= self.nb_individuals {
            return Err(InferenceError::IndexOutOfRange {
                what: "individuals",
                index: individual,
                len: self.nb_individuals,
            });
        }
        if class >= self.nb_classes {
            return Err(InferenceError::IndexOutOfRange {
                what: "classes",
                index: class,
                len: self.nb_classes,
            });
        }
        Ok(individual * self.nb_classes + class)
    }
}
