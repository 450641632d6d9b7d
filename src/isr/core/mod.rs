//! core — permutation values, observation constraints, enumeration, options.
//!
//! Purpose
//! -------
//! Collect the structural building blocks of the ISR rank model: the
//! dual-representation permutation value ([`RankVal`]), the per-position
//! observation constraints ([`PositionConstraint`], [`ObservationPattern`]),
//! bounded enumeration of completions and presentation orders, estimation
//! options ([`IsrOptions`]), and scalar validation helpers. The model layer
//! in `isr::models` builds on these primitives.
//!
//! Invariants & assumptions
//! ------------------------
//! - Items and positions are 0-based and lie in `0..n` for a rank of size `n`.
//! - [`RankVal`] views are mutual inverses at all times.
//! - Observation patterns are validated against `n` at construction, so
//!   enumeration can assume well-formed candidate lists.
//! - Exhaustive enumeration is bounded by [`IsrOptions::enumeration_bound`];
//!   exceeding it is an error, never a silent truncation.
//!
//! Conventions
//! -----------
//! - This layer performs no logging and holds no RNG state; random routines
//!   borrow the caller's generator.

pub mod enumeration;
pub mod observation;
pub mod options;
pub mod permutation;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::enumeration::{
    enumerate_completions, enumerate_orders, first_completion, random_completion,
};
pub use self::observation::{ObservationPattern, PositionConstraint};
pub use self::options::{DEFAULT_ENUMERATION_BOUND, IsrOptions};
pub use self::permutation::{RankVal, switch_representation};
pub use self::validation::{
    checked_factorial, validate_confidence_level, validate_index, validate_model_params,
    validate_precision,
};

pub mod prelude {
    pub use super::observation::{ObservationPattern, PositionConstraint};
    pub use super::options::IsrOptions;
    pub use super::permutation::RankVal;
}
