//! Beta distribution as a value type.
//!
//! Dirichlet coordinate marginals and stick-breaking conditionals are Beta
//! distributions, and the inference engine passes them around as plain values.
//! The CDF uses the regularized incomplete beta function with a
//! continued-fraction approximation (Numerical Recipes); the inverse CDF
//! bisects the CDF.

use serde::{Deserialize, Serialize};

use super::stable::log_beta;

const BETACF_MAX_ITERS: usize = 200;
const BETACF_EPS: f64 = 3.0e-7;
const BETACF_FPMIN: f64 = 1.0e-30;
const INV_CDF_TOL: f64 = 1e-10;

/// Beta(alpha, beta) with strictly positive shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beta {
    pub alpha: f64,
    pub beta: f64,
}

impl Beta {
    /// Create a Beta distribution with validation.
    ///
    /// Returns None if either shape is non-positive or NaN.
    pub fn new(alpha: f64, beta: f64) -> Option<Self> {
        if alpha.is_nan() || beta.is_nan() || alpha <= 0.0 || beta <= 0.0 {
            return None;
        }
        Some(Self { alpha, beta })
    }

    /// Mean: alpha / (alpha + beta).
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Variance: alpha*beta / ((alpha+beta)^2 (alpha+beta+1)).
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        (self.alpha * self.beta) / (sum * sum * (sum + 1.0))
    }

    /// Log of the PDF at x.
    pub fn log_pdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if !(0.0..=1.0).contains(&x) {
            return f64::NEG_INFINITY;
        }
        if x == 0.0 {
            if self.alpha < 1.0 {
                return f64::INFINITY;
            }
            if self.alpha > 1.0 {
                return f64::NEG_INFINITY;
            }
            return -log_beta(1.0, self.beta);
        }
        if x == 1.0 {
            if self.beta < 1.0 {
                return f64::INFINITY;
            }
            if self.beta > 1.0 {
                return f64::NEG_INFINITY;
            }
            return -log_beta(self.alpha, 1.0);
        }
        let log_x = x.ln();
        let log_one_minus = (-x).ln_1p();
        (self.alpha - 1.0) * log_x + (self.beta - 1.0) * log_one_minus
            - log_beta(self.alpha, self.beta)
    }

    /// PDF at x.
    pub fn pdf(&self, x: f64) -> f64 {
        let log_pdf = self.log_pdf(x);
        if log_pdf.is_nan() {
            return f64::NAN;
        }
        if log_pdf == f64::INFINITY {
            return f64::INFINITY;
        }
        if log_pdf == f64::NEG_INFINITY {
            return 0.0;
        }
        log_pdf.exp()
    }

    /// CDF: regularized incomplete beta function I_x(alpha, beta).
    pub fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        let ln_beta = log_beta(self.alpha, self.beta);
        let bt = (self.alpha * x.ln() + self.beta * (1.0 - x).ln() - ln_beta).exp();
        let threshold = (self.alpha + 1.0) / (self.alpha + self.beta + 2.0);
        if x < threshold {
            bt * betacf(self.alpha, self.beta, x) / self.alpha
        } else {
            1.0 - bt * betacf(self.beta, self.alpha, 1.0 - x) / self.beta
        }
    }

    /// Inverse CDF (quantile) by bisection.
    ///
    /// The importance restriction takes the 2nd and 98th percentiles of the
    /// would-be posterior marginals as its inclusion bounds.
    pub fn percentile(&self, p: f64) -> f64 {
        if p.is_nan() {
            return f64::NAN;
        }
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return 1.0;
        }

        let mut low = 0.0;
        let mut high = 1.0;
        let mut mid = 0.5;
        for _ in 0..200 {
            mid = 0.5 * (low + high);
            let cdf = self.cdf(mid);
            if cdf.is_nan() {
                return f64::NAN;
            }
            let delta = cdf - p;
            if delta.abs() < INV_CDF_TOL {
                return mid;
            }
            if delta < 0.0 {
                low = mid;
            } else {
                high = mid;
            }
        }
        mid
    }
}

fn betacf(alpha: f64, beta: f64, x: f64) -> f64 {
    let qab = alpha + beta;
    let qap = alpha + 1.0;
    let qam = alpha - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < BETACF_FPMIN {
        d = BETACF_FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=BETACF_MAX_ITERS {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;
        let aa = m_f * (beta - m_f) * x / ((qam + m2) * (alpha + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETACF_FPMIN {
            d = BETACF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETACF_FPMIN {
            c = BETACF_FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(alpha + m_f) * (qab + m_f) * x / ((alpha + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETACF_FPMIN {
            d = BETACF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETACF_FPMIN {
            c = BETACF_FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < BETACF_EPS {
            break;
        }
    }

    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn new_rejects_invalid_shapes() {
        assert!(Beta::new(0.0, 1.0).is_none());
        assert!(Beta::new(1.0, -1.0).is_none());
        assert!(Beta::new(f64::NAN, 1.0).is_none());
        assert!(Beta::new(2.0, 5.0).is_some());
    }

    #[test]
    fn mean_and_variance_match_closed_form() {
        let b = Beta::new(2.0, 5.0).unwrap();
        assert!(approx_eq(b.mean(), 2.0 / 7.0, 1e-12));
        assert!(approx_eq(b.variance(), 10.0 / 392.0, 1e-12));
    }

    #[test]
    fn uniform_pdf_is_one() {
        let b = Beta::new(1.0, 1.0).unwrap();
        assert!(approx_eq(b.pdf(0.33), 1.0, 1e-12));
    }

    #[test]
    fn pdf_known_value_beta_2_5() {
        let b = Beta::new(2.0, 5.0).unwrap();
        assert!(approx_eq(b.pdf(0.2), 2.4576, 1e-6));
    }

    #[test]
    fn log_pdf_matches_pdf() {
        let b = Beta::new(1.2, 3.4).unwrap();
        assert!(approx_eq(b.pdf(0.4).ln(), b.log_pdf(0.4), 1e-10));
    }

    #[test]
    fn pdf_symmetry() {
        let left = Beta::new(2.3, 4.7).unwrap().pdf(0.27);
        let right = Beta::new(4.7, 2.3).unwrap().pdf(1.0 - 0.27);
        assert!(approx_eq(left, right, 1e-10));
    }

    #[test]
    fn cdf_uniform_matches_identity() {
        let b = Beta::new(1.0, 1.0).unwrap();
        assert!(approx_eq(b.cdf(0.42), 0.42, 1e-6));
    }

    #[test]
    fn cdf_monotone() {
        let b = Beta::new(2.0, 5.0).unwrap();
        assert!(b.cdf(0.2) < b.cdf(0.7));
    }

    #[test]
    fn percentile_uniform() {
        let b = Beta::new(1.0, 1.0).unwrap();
        assert!(approx_eq(b.percentile(0.73), 0.73, 1e-6));
    }

    #[test]
    fn percentile_inverts_cdf() {
        let b = Beta::new(2.0, 5.0).unwrap();
        let x = b.percentile(0.25);
        assert!(approx_eq(b.cdf(x), 0.25, 1e-6));
    }

    #[test]
    fn percentile_edges() {
        let b = Beta::new(4.0, 5.0).unwrap();
        assert!(approx_eq(b.percentile(0.0), 0.0, 1e-12));
        assert!(approx_eq(b.percentile(1.0), 1.0, 1e-12));
    }

    #[test]
    fn marginal_after_classic_update() {
        // Dirichlet([4,3,2]) coordinate 0 marginal: Beta(4, 5), mean 4/9
        let b = Beta::new(4.0, 5.0).unwrap();
        assert!(approx_eq(b.mean(), 4.0 / 9.0, 1e-12));
    }

    #[test]
    fn log_pdf_edge_behavior_at_zero() {
        let spike = Beta::new(0.5, 2.0).unwrap().log_pdf(0.0);
        assert!(spike.is_infinite() && spike.is_sign_positive());

        let flat = Beta::new(2.0, 2.0).unwrap().log_pdf(0.0);
        assert!(flat.is_infinite() && flat.is_sign_negative());
    }
}
