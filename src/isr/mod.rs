//! isr — Insertion-Sort Rank model for partially observed rankings.
//!
//! Purpose
//! -------
//! Provide the representation, generative model and Gibbs/SEM machinery of
//! the ISR model: ranks are produced by inserting items one at a time, each
//! comparison agreeing with a central rank μ with probability π. This is the
//! main entry point of the crate for clustering rankings with missing or
//! partially known positions.
//!
//! Key behaviors
//! -------------
//! - [`core`]: permutation values, observation constraints, bounded
//!   enumeration, estimation options and validation helpers.
//! - [`models`]: rank individuals, class models and the class estimation
//!   driver.
//! - [`errors`]: the unified [`RankError`] type and [`RankResult`] alias.
//!
//! Conventions
//! -----------
//! - Items and positions are 0-based; the text parser removes any
//!   user-facing offset.
//! - Exact computations are guarded by
//!   [`IsrOptions::enumeration_bound`]; exceeding it is a recoverable
//!   [`RankError::ConstraintTooLarge`].
//! - Logging goes through `tracing`; the crate never installs a subscriber.
//!
//! Downstream usage
//! ----------------
//! 1. Parse observations with [`parse_rank_strs`](crate::parsing::parse_rank_strs)
//!    or build [`RankIndividual`]s directly.
//! 2. Create a [`RankClassModel`] per class and assign members.
//! 3. Drive each class with a [`ClassEstimation`] (or call the samplers and
//!    M-step directly) and read back the parameters, summaries and
//!    per-individual log-likelihood contributions.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{IsrOptions, ObservationPattern, PositionConstraint, RankVal};
pub use self::errors::{RankError, RankResult};
pub use self::models::{
    ClassEstimation, ComparisonCounts, CompletedLogProbability, EstimationPhase, RankClassModel,
    RankIndividual,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rank_isr::isr::prelude::*;
//
// to import the main ISR surface in a single line.

pub mod prelude {
    pub use super::{
        ClassEstimation, EstimationPhase, IsrOptions, ObservationPattern, PositionConstraint,
        RankClassModel, RankError, RankIndividual, RankResult, RankVal,
    };
}
