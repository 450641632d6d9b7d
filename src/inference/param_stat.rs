//! Posterior statistics for ISR parameters and imputed ranks.
//!
//! Purpose
//! -------
//! Accumulate the draws produced during the run phase of a Gibbs/SEM
//! estimation and reduce them to point estimates and confidence summaries:
//!
//! - [`RankStat`] counts occurrences of rank values (central ranks, or the
//!   completions of one partially observed individual) and reports the mode
//!   plus the smallest set of most frequent ranks covering the confidence
//!   level.
//! - [`PrecisionStat`] stores precision draws and reports mean, median and
//!   a quantile interval.
//! - [`ParamStatistics`] pairs both for one class.
//!
//! Conventions
//! -----------
//! - `record(iteration, total_iterations, …)` expects `iteration` in
//!   `0..total_iterations`; `iteration == 0` starts a fresh run and discards
//!   earlier draws.
//! - The interval bounds are the sample quantiles at `(1 − c)/2` and
//!   `1 − (1 − c)/2`, computed by `statrs` order statistics.
//! - Mode ties resolve to the lexicographically smallest rank.
use std::collections::BTreeMap;

use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::{
    inference::errors::{InferenceError, InferenceResult},
    isr::core::permutation::RankVal,
};

fn validate_level(confidence_level: f64) -> InferenceResult<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(InferenceError::InvalidConfidenceLevel { value: confidence_level });
    }
    Ok(confidence_level)
}

fn validate_iteration(iteration: usize, total_iterations: usize) -> InferenceResult<()> {
    if iteration >= total_iterations {
        return Err(InferenceError::IndexOutOfRange {
            what: "iterations",
            index: iteration,
            len: total_iterations,
        });
    }
    Ok(())
}

/// Summary of a rank sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RankSummary {
    /// Most frequent rank.
    pub mode: RankVal,
    /// Most frequent ranks with their empirical probability, by decreasing
    /// frequency, until the cumulative probability reaches the confidence level.
    pub distribution: Vec<(RankVal, f64)>,
    pub nb_samples: usize,
}

/// Occurrence counts of sampled ranks.
#[derive(Debug, Clone, PartialEq)]
pub struct RankStat {
    counts: BTreeMap<RankVal, usize>,
    nb_samples: usize,
    confidence_level: f64,
}

impl RankStat {
    /// # Errors
    /// - [`InferenceError::InvalidConfidenceLevel`] unless `0 < level < 1`.
    pub fn new(confidence_level: f64) -> InferenceResult<RankStat> {
        Ok(RankStat { counts: BTreeMap::new(), nb_samples: 0, confidence_level: validate_level(confidence_level)? })
    }

    pub fn record(&mut self, iteration: usize, total_iterations: usize, rank: &RankVal) -> InferenceResult<()> {
        validate_iteration(iteration, total_iterations)?;
        if iteration == 0 {
            self.counts.clear();
            self.nb_samples = 0;
        }
        *self.counts.entry(rank.clone()).or_default() += 1;
        self.nb_samples += 1;
        Ok(())
    }

    pub fn nb_samples(&self) -> usize {
        self.nb_samples
    }

    /// Most frequent rank so far, if any.
    pub fn mode(&self) -> Option<&RankVal> {
        // `max_by_key` keeps the last maximum; iterate in reverse so the
        // smallest rank wins ties.
        self.counts.iter().rev().max_by_key(|(_, c)| **c).map(|(r, _)| r)
    }

    /// # Errors
    /// - [`InferenceError::EmptyAccumulator`] before any draw is recorded.
    pub fn finalize(&self) -> InferenceResult<RankSummary> {
        let mode = self.mode().ok_or(InferenceError::EmptyAccumulator)?.clone();

        let mut by_frequency: Vec<(&RankVal, usize)> = self.counts.iter().map(|(r, c)| (r, *c)).collect();
        by_frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let total = self.nb_samples as f64;
        let mut cumulative = 0.0;
        let mut distribution = Vec::new();
        for (rank, count) in by_frequency {
            let proba = count as f64 / total;
            distribution.push((rank.clone(), proba));
            cumulative += proba;
            if cumulative >= self.confidence_level {
                break;
            }
        }
        Ok(RankSummary { mode, distribution, nb_samples: self.nb_samples })
    }
}

/// Summary of a precision sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionSummary {
    pub mean: f64,
    pub median: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: f64,
    pub nb_samples: usize,
}

/// Stored precision draws.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionStat {
    samples: Vec<f64>,
    confidence_level: f64,
}

impl PrecisionStat {
    pub fn new(confidence_level: f64) -> InferenceResult<PrecisionStat> {
        Ok(PrecisionStat { samples: Vec::new(), confidence_level: validate_level(confidence_level)? })
    }

    pub fn record(&mut self, iteration: usize, total_iterations: usize, precision: f64) -> InferenceResult<()> {
        validate_iteration(iteration, total_iterations)?;
        if iteration == 0 {
            self.samples.clear();
            self.samples.reserve(total_iterations);
        }
        self.samples.push(precision);
        Ok(())
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn finalize(&self) -> InferenceResult<PrecisionSummary> {
        if self.samples.is_empty() {
            return Err(InferenceError::EmptyAccumulator);
        }
        let alpha = (1.0 - self.confidence_level) / 2.0;
        let mean = self.samples.iter().mean();
        let mut data = Data::new(self.samples.clone());
        Ok(PrecisionSummary {
            mean,
            median: data.quantile(0.5),
            lower: data.quantile(alpha),
            upper: data.quantile(1.0 - alpha),
            confidence_level: self.confidence_level,
            nb_samples: self.samples.len(),
        })
    }
}

/// Summary of one class's `(central_rank, precision)` draws.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSummary {
    pub modal_rank: RankVal,
    pub rank_distribution: Vec<(RankVal, f64)>,
    pub precision: PrecisionSummary,
}

/// Joint accumulator for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStatistics {
    rank: RankStat,
    precision: PrecisionStat,
}

impl ParamStatistics {
    pub fn new(confidence_level: f64) -> InferenceResult<ParamStatistics> {
        Ok(ParamStatistics { rank: RankStat::new(confidence_level)?, precision: PrecisionStat::new(confidence_level)? })
    }

    pub fn record(
        &mut self, iteration: usize, total_iterations: usize, central_rank: &RankVal, precision: f64,
    ) -> InferenceResult<()> {
        self.rank.record(iteration, total_iterations, central_rank)?;
        self.precision.record(iteration, total_iterations, precision)
    }

    pub fn nb_samples(&self) -> usize {
        self.rank.nb_samples()
    }

    pub fn rank(&self) -> &RankStat {
        &self.rank
    }

    pub fn precision(&self) -> &PrecisionStat {
        &self.precision
    }

    pub fn finalize(&self) -> InferenceResult<ParamSummary> {
        let ranks = self.rank.finalize()?;
        Ok(ParamSummary {
            modal_rank: ranks.mode,
            rank_distribution: ranks.distribution,
            precision: self.precision.finalize()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rank(ordering: &[usize]) -> RankVal {
        RankVal::from_ordering(ordering.to_vec()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Mode, distribution cut-off, and tie breaking.
    //
    // Given
    // -----
    // - Ten draws: [1,0,2] ×5, [0,2,1] ×3, [0,1,2] ×2; confidence 0.75.
    //
    // Expect
    // ------
    // - Mode [1,0,2]; distribution stops after the second rank (0.8 ≥ 0.75).
    fn rank_stat_reports_mode_and_covering_set() {
        // Arrange
        let mut stat = RankStat::new(0.75).unwrap();
        let draws = [
            vec![1, 0, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
            vec![0, 1, 2],
            vec![1, 0, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
            vec![0, 1, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
        ];

        // Act
        for (it, d) in draws.iter().enumerate() {
            stat.record(it, draws.len(), &rank(d)).unwrap();
        }
        let summary = stat.finalize().unwrap();

        // Assert
        assert_eq!(summary.mode, rank(&[1, 0, 2]));
        assert_eq!(summary.nb_samples, 10);
        assert_eq!(summary.distribution.len(), 2);
        assert_relative_eq!(summary.distribution[0].1, 0.5);
        assert_eq!(summary.distribution[1].0, rank(&[0, 2, 1]));

        // A tie resolves to the smallest rank in lexicographic order.
        let mut tied = RankStat::new(0.9).unwrap();
        tied.record(0, 2, &rank(&[2, 1, 0])).unwrap();
        tied.record(1, 2, &rank(&[0, 2, 1])).unwrap();
        assert_eq!(tied.mode(), Some(&rank(&[0, 2, 1])));
    }

    #[test]
    // Purpose
    // -------
    // Iteration 0 restarts the accumulator; out-of-range iterations fail.
    fn iteration_zero_resets_the_run() {
        let mut stat = PrecisionStat::new(0.9).unwrap();
        stat.record(0, 3, 0.1).unwrap();
        stat.record(1, 3, 0.2).unwrap();
        stat.record(0, 3, 0.7).unwrap();
        assert_eq!(stat.samples(), &[0.7]);
        assert!(matches!(stat.record(3, 3, 0.5), Err(InferenceError::IndexOutOfRange { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Precision summaries on a small symmetric sample.
    fn precision_summary_mean_median_interval() {
        // Arrange
        let mut stat = PrecisionStat::new(0.9).unwrap();
        let values = [0.5, 0.1, 0.3, 0.4, 0.2];
        for (it, v) in values.iter().enumerate() {
            stat.record(it, values.len(), *v).unwrap();
        }

        // Act
        let s = stat.finalize().unwrap();

        // Assert
        assert_relative_eq!(s.mean, 0.3, epsilon = 1e-12);
        assert_relative_eq!(s.median, 0.3, epsilon = 1e-12);
        assert!(s.lower >= 0.1 && s.lower <= s.median);
        assert!(s.upper <= 0.5 && s.upper >= s.median);
        assert_eq!(s.nb_samples, 5);
        assert_eq!(s.confidence_level, 0.9);
    }

    #[test]
    fn empty_accumulators_and_bad_levels_fail() {
        assert_eq!(ParamStatistics::new(0.95).unwrap().finalize(), Err(InferenceError::EmptyAccumulator));
        assert!(matches!(RankStat::new(1.0), Err(InferenceError::InvalidConfidenceLevel { .. })));
        assert!(matches!(PrecisionStat::new(f64::NAN), Err(InferenceError::InvalidConfidenceLevel { .. })));
    }

    #[test]
    fn param_statistics_pairs_ranks_and_precisions() {
        let mut stats = ParamStatistics::new(0.95).unwrap();
        let mu = rank(&[2, 0, 1]);
        for it in 0..4 {
            stats.record(it, 4, &mu, 0.6 + 0.1 * it as f64).unwrap();
        }
        let summary = stats.finalize().unwrap();
        assert_eq!(summary.modal_rank, mu);
        assert_eq!(summary.rank_distribution, vec![(mu.clone(), 1.0)]);
        assert_relative_eq!(summary.precision.mean, 0.75, epsilon = 1e-12);
        assert_eq!(stats.nb_samples(), 4);
    }
}
