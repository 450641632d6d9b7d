//! models — ISR individuals, class models, and the estimation driver.
//!
//! Purpose
//! -------
//! Collect the stochastic side of the ISR rank model on top of `isr::core`:
//! the per-individual generative model and Gibbs samplers
//! ([`RankIndividual`]), the per-class parameters with their Gibbs and
//! M-step updates ([`RankClassModel`]), and the burn-in / run state machine
//! that drives a class estimation ([`ClassEstimation`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - An individual's completion satisfies its observation pattern at all
//!   times; samplers only use exchanges that preserve it.
//! - Precision parameters lie in [0, 1]; M-step estimates lie strictly
//!   inside (0, 1).
//! - Random routines borrow one caller-owned generator; results are
//!   reproducible for a fixed seed.
//!
//! Testing notes
//! -------------
//! - [`individual`] tests compare the Gibbs samplers against the exact
//!   conditional distributions on small ranks.
//! - [`class`] tests check parameter recovery on simulated data.
//! - [`estimation`] tests cover phase transitions, imputation and the
//!   harmonic-mean fallback.

pub mod class;
pub mod estimation;
pub mod individual;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::class::RankClassModel;
pub use self::estimation::{ClassEstimation, EstimationPhase};
pub use self::individual::{ComparisonCounts, CompletedLogProbability, RankIndividual};

pub mod prelude {
    pub use super::class::RankClassModel;
    pub use super::estimation::{ClassEstimation, EstimationPhase};
    pub use super::individual::RankIndividual;
}
