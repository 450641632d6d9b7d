//! numerical_stability — log-domain helpers for discrete likelihoods.
//!
//! Purpose
//! -------
//! Collect the small numerically stable primitives used across the ISR
//! samplers and estimators: log-sum-exp reductions, normalization of
//! log-weights into a multinomial distribution, and Bernoulli path
//! log-probabilities that stay well defined at the boundaries of [0, 1].
//!
//! Key behaviors
//! -------------
//! - [`log_sum_exp`] reduces a slice of log-values with a max shift so that
//!   sums of very small probabilities (e.g. `1 / n!` scaled terms) neither
//!   underflow nor lose precision.
//! - [`log_to_multi`] / [`log_pair_to_multi`] turn unnormalized
//!   log-weights into probabilities summing to one; they feed every
//!   two-state Gibbs decision in the crate.
//! - [`ln_bernoulli_path`] evaluates `g·ln(π) + b·ln(1 − π)` while treating
//!   `0 · ln(0)` as `0`, so degenerate precisions (`π ∈ {0, 1}`) do not
//!   produce NaNs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs may contain `-∞` (impossible events) but never `NaN` or `+∞`;
//!   upstream validation guarantees probabilities lie in [0, 1].
//! - When every weight is `-∞`, normalization falls back to the uniform
//!   distribution instead of returning NaNs.
//!
//! Conventions
//! -----------
//! - Pure functions over `f64` slices; no I/O, no logging, no allocation
//!   beyond the returned vectors.

pub mod log_domain;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::log_domain::{
    ln_bernoulli_path, ln_factorial, log_mean_exp, log_pair_to_multi, log_sum_exp, log_to_multi,
};
