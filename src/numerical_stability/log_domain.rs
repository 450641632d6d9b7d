//! Log-domain reductions and normalizations.
//!
//! These helpers keep products of many small probabilities in log space and
//! only exponentiate after a max shift. They are the numerical backbone of
//! the ISR Gibbs steps (two-state heat-bath decisions), of the exact
//! conditional distributions, and of the harmonic-mean estimator.
use statrs::function::factorial;

/// Numerically stable `ln(Σ exp(x_i))`.
///
/// Returns `-∞` for an empty slice or when every entry is `-∞`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Numerically stable `ln((1/m) Σ exp(x_i))` for `m = values.len() > 0`.
///
/// Returns `NaN` for an empty slice; callers decide how to report empty input.
pub fn log_mean_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    log_sum_exp(values) - (values.len() as f64).ln()
}

/// Normalize log-weights into a probability vector.
///
/// # Returns
/// - A vector of the same length whose entries sum to one.
/// - The uniform distribution when all weights are `-∞`.
/// - An empty vector for empty input.
pub fn log_to_multi(log_weights: &[f64]) -> Vec<f64> {
    if log_weights.is_empty() {
        return Vec::new();
    }
    let norm = log_sum_exp(log_weights);
    if norm == f64::NEG_INFINITY {
        let uniform = 1.0 / log_weights.len() as f64;
        return vec![uniform; log_weights.len()];
    }
    log_weights.iter().map(|&w| (w - norm).exp()).collect()
}

/// Probability of the second state in a two-state decision.
///
/// Equivalent to `log_to_multi(&[current, proposed])[1]` without allocating:
/// `exp(proposed) / (exp(current) + exp(proposed))`, computed as a logistic
/// of the log-ratio. Both `-∞` yields `0.5`.
pub fn log_pair_to_multi(current: f64, proposed: f64) -> f64 {
    match (current == f64::NEG_INFINITY, proposed == f64::NEG_INFINITY) {
        (true, true) => 0.5,
        (true, false) => 1.0,
        (false, true) => 0.0,
        (false, false) => {
            let delta = proposed - current;
            if delta >= 0.0 {
                1.0 / (1.0 + (-delta).exp())
            } else {
                let e = delta.exp();
                e / (1.0 + e)
            }
        }
    }
}

/// `good · ln(π) + bad · ln(1 − π)` with the convention `0 · ln(0) = 0`.
///
/// A zero count contributes nothing, so `π = 1` with no disagreement (or
/// `π = 0` with no agreement) has log-probability `0` rather than `NaN`.
pub fn ln_bernoulli_path(good: usize, bad: usize, pi: f64) -> f64 {
    let mut log_proba = 0.0;
    if good > 0 {
        log_proba += good as f64 * pi.ln();
    }
    if bad > 0 {
        log_proba += bad as f64 * (1.0 - pi).ln();
    }
    log_proba
}

/// `ln(n!)`, delegated to statrs.
pub fn ln_factorial(n: usize) -> f64 {
    factorial::ln_factorial(n as u64)
}
