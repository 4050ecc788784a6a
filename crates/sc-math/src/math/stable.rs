//! Numerically stable primitives for log-domain likelihood aggregation.
//!
//! Hierarchical updates multiply many small per-hypothesis likelihoods; all
//! aggregation here subtracts the running maximum before exponentiating so a
//! batch of very negative log-likelihoods never collapses to all-zero weights.

use std::f64::consts::PI;

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs; NaN propagates.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// exp(v - max(values)) for each element, without normalizing.
///
/// Rescales a vector of log-likelihoods into ratios relative to the largest,
/// so the caller can multiply them into existing linear-domain weights. All
/// -inf inputs (every likelihood underflowed to zero) produce a zero vector;
/// the caller is responsible for treating that as a degenerate update.
pub fn exp_scaled(log_values: &[f64]) -> Vec<f64> {
    let max = log_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return vec![0.0; log_values.len()];
    }
    log_values.iter().map(|v| (v - max).exp()).collect()
}

/// Normalize a vector of log-probabilities into probabilities summing to 1.
///
/// Subtracts the maximum before exponentiating. Degenerate input (empty,
/// all -inf, or containing NaN) yields an all-zero vector for the caller to
/// reject.
pub fn normalize_log_probs(log_probs: &[f64]) -> Vec<f64> {
    let scaled = exp_scaled(log_probs);
    let total: f64 = scaled.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return vec![0.0; log_probs.len()];
    }
    scaled.iter().map(|v| v / total).collect()
}

/// Natural log of the Gamma function (log |Gamma(z)|).
///
/// Lanczos approximation with reflection for z < 0.5.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z <= 0.0 {
        let z_round = z.round();
        if (z - z_round).abs() < 1e-15 {
            return f64::NAN;
        }
    }
    if z < 0.5 {
        let sin_pi = (PI * z).sin();
        if sin_pi == 0.0 {
            return f64::NAN;
        }
        return PI.ln() - sin_pi.abs().ln() - log_gamma(1.0 - z);
    }

    let z_minus = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, coeff) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += coeff / (z_minus + i as f64);
    }
    let t = z_minus + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (z_minus + 0.5) * t.ln() - t + x.ln()
}

/// log Beta(a, b) = log Gamma(a) + log Gamma(b) - log Gamma(a+b).
pub fn log_beta(a: f64, b: f64) -> f64 {
    log_gamma(a) + log_gamma(b) - log_gamma(a + b)
}

/// log(n!) using the Gamma function.
pub fn log_factorial(n: u64) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    log_gamma((n as f64) + 1.0)
}

/// log binomial coefficient: log(n choose k).
///
/// The hierarchical suite uses this as the correction for the number of ways
/// the m observed categories could have been selected out of n candidates.
pub fn log_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    if k == 0 || k == n {
        return 0.0;
    }
    log_factorial(n) - log_factorial(k) - log_factorial(n - k)
}
