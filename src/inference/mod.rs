//! inference — marginal likelihood estimation and posterior summaries.
//!
//! Purpose
//! -------
//! Provide the estimators applied on top of a Gibbs/SEM run of the ISR model:
//! the harmonic-mean estimator of observed log-likelihoods, used when exact
//! enumeration of completions is infeasible, and the accumulators that turn
//! the sampled central ranks, precisions and completions into point
//! estimates with confidence summaries.
//!
//! Key behaviors
//! -------------
//! - [`HarmonicMeanEstimator`] stores per-(individual, class) samples and
//!   reduces them in log domain.
//! - [`RankStat`], [`PrecisionStat`] and [`ParamStatistics`] accumulate run
//!   draws and produce [`RankSummary`], [`PrecisionSummary`] and
//!   [`ParamSummary`].
//! - Failures are reported as [`InferenceError`]; the ISR layer lifts them
//!   into its own error type.
//!
//! Conventions
//! -----------
//! - Individuals index rows and classes index columns of estimator matrices.
//! - No logging, no global state.

pub mod errors;
pub mod harmonic_mean;
pub mod param_stat;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::harmonic_mean::HarmonicMeanEstimator;
pub use self::param_stat::{
    ParamStatistics, ParamSummary, PrecisionStat, PrecisionSummary, RankStat, RankSummary,
};

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::harmonic_mean::HarmonicMeanEstimator;
    pub use super::param_stat::{ParamStatistics, ParamSummary, PrecisionSummary, RankSummary};
}
