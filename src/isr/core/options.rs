//! ISR options — configuration for estimation runs.
//!
//! Purpose
//! -------
//! Collect the knobs of a class estimation in one validated value: sweep
//! counts for burn-in and run phases, M-step sampling effort, the exhaustive
//! enumeration safety bound, the confidence level of posterior summaries,
//! and the optional RNG seed.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`IsrOptions::new`] rejects a zero run length, zero M-step iterations,
//!   a zero enumeration bound, and confidence levels outside (0, 1).
//!   `nb_burn_in = 0` is allowed and starts recording at the first sweep. Fields are public for reading;
//!   construct through `new` or `Default` to keep them valid.
//! - `m_step_max_attempts >= m_step_iterations`: the M-step needs at least
//!   as many sweeps as valid draws it tries to collect.
//!
//! Downstream usage
//! ----------------
//! - Pass an [`IsrOptions`] to [`ClassEstimation`](crate::isr::models::estimation::ClassEstimation)
//!   and to [`RankClassModel::m_step`](crate::isr::models::class::RankClassModel::m_step).
//! - Call [`IsrOptions::rng`] to obtain the generator used for a whole run.
use rand::{SeedableRng, rngs::StdRng};

use crate::isr::{
    core::validation::{validate_confidence_level, validate_count},
    errors::{RankError, RankResult},
};

/// Default enumeration bound: `8!`.
pub const DEFAULT_ENUMERATION_BOUND: usize = 40_320;

/// IsrOptions — estimation-time configuration for one ISR class.
///
/// Fields
/// ------
/// - `enumeration_bound`: maximum number of values (completions, or
///   completions × presentation orders) any exact enumeration may visit.
/// - `confidence_level`: mass of the central-rank distribution and of the
///   precision interval reported by the summaries.
/// - `nb_burn_in`, `nb_run`: number of Gibbs sweeps in each phase.
/// - `m_step_iterations`: valid central-rank draws collected per M-step.
/// - `m_step_max_attempts`: sweeps the M-step may spend collecting them.
/// - `seed`: RNG seed; `None` draws one from the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct IsrOptions {
    pub enumeration_bound: usize,
    pub confidence_level: f64,
    pub nb_burn_in: usize,
    pub nb_run: usize,
    pub m_step_iterations: usize,
    pub m_step_max_attempts: usize,
    pub seed: Option<u64>,
}

impl IsrOptions {
    /// Construct validated options.
    ///
    /// Errors
    /// ------
    /// - `RankError::InvalidOptions`
    ///   Returned when `enumeration_bound`, `nb_run` or `m_step_iterations`
    ///   is zero, the confidence level is not strictly inside (0, 1), or
    ///   `m_step_max_attempts < m_step_iterations`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        enumeration_bound: usize, confidence_level: f64, nb_burn_in: usize, nb_run: usize,
        m_step_iterations: usize, m_step_max_attempts: usize, seed: Option<u64>,
    ) -> RankResult<IsrOptions> {
        validate_count("enumeration_bound", enumeration_bound, 1)?;
        validate_confidence_level(confidence_level)?;
        validate_count("nb_run", nb_run, 1)?;
        validate_count("m_step_iterations", m_step_iterations, 1)?;
        if m_step_max_attempts < m_step_iterations {
            return Err(RankError::InvalidOptions {
                name: "m_step_max_attempts",
                value: m_step_max_attempts as f64,
                reason: "Attempts must be at least the number of M-step iterations.",
            });
        }
        Ok(IsrOptions {
            enumeration_bound,
            confidence_level,
            nb_burn_in,
            nb_run,
            m_step_iterations,
            m_step_max_attempts,
            seed,
        })
    }

    /// Copy of `self` with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> IsrOptions {
        self.seed = Some(seed);
        self
    }

    /// Generator for one run: seeded if `seed` is set, OS entropy otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for IsrOptions {
    fn default() -> Self {
        IsrOptions {
            enumeration_bound: DEFAULT_ENUMERATION_BOUND,
            confidence_level: 0.95,
            nb_burn_in: 100,
            nb_run: 100,
            m_step_iterations: 10,
            m_step_max_attempts: 1_000,
            seed: None,
        }
    }
}
