//! rank_isr — Insertion-Sort Rank model for partially observed rankings.
//!
//! Purpose
//! -------
//! Serve as the crate root for the ISR mixture component: the representation
//! of ranks with missing or partially known positions, the generative
//! insertion-sort model, the Gibbs samplers and stochastic EM updates of a
//! class, and the estimators that turn a run into parameters and
//! log-likelihood contributions.
//!
//! Key behaviors
//! -------------
//! - [`isr`]: permutation values, observation patterns, rank individuals,
//!   class models and the class estimation driver.
//! - [`inference`]: harmonic-mean marginal likelihood estimator and the run
//!   accumulators (modal rank, precision intervals, imputed completions).
//! - [`numerical_stability`]: log-domain reductions shared by the samplers.
//! - [`parsing`]: text records (`3, ?, {1 2}`) to rank individuals, with a
//!   warning log for skipped records.
//!
//! Invariants & assumptions
//! ------------------------
//! - Items and positions are 0-based inside the crate.
//! - Every random routine borrows a caller-owned `rand::Rng`; a fixed seed
//!   makes a run reproducible.
//! - Exact enumerations are guarded by a configurable bound and fail with a
//!   recoverable error instead of truncating.
//!
//! Downstream usage
//! ----------------
//! - A mixture-model host creates one [`isr::RankClassModel`] per class,
//!   assigns members, drives it with [`isr::ClassEstimation`], and reads back
//!   `(central_rank, precision)` plus per-individual contributions.
//! - `use rank_isr::isr::prelude::*;` imports the main surface.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/integration_isr_pipeline.rs`
//!   covers simulation, parsing and estimation end to end.

pub mod inference;
pub mod isr;
pub mod numerical_stability;
pub mod parsing;
