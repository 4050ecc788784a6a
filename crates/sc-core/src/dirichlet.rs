//! Dirichlet-multinomial model over category prevalences.
//!
//! The model uses:
//! - Prior: `p = (p_1..p_n) ~ Dirichlet(α_1..α_n)` with all α_i = 1 (flat)
//! - Likelihood: `x | p ~ Multinomial(Σx, p)` over the observed categories
//! - Posterior: `p | x ~ Dirichlet(α_i + x_i)` (conjugate, closed form)
//!
//! Each instance is tied to one candidate species total `n` and owns its
//! concentration vector exclusively. Marginals are exact Betas; likelihoods
//! are single-draw Monte-Carlo estimates amplified by averaging in the suite.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Gamma};

use sc_math::Beta;

use crate::error::{Error, Result};

/// Dirichlet model for one candidate species total.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletModel {
    params: Vec<f64>,
}

impl DirichletModel {
    /// Flat prior over `n` categories (every concentration 1).
    ///
    /// Returns None for n = 0.
    pub fn new(n: u32) -> Option<Self> {
        if n == 0 {
            return None;
        }
        Some(Self {
            params: vec![1.0; n as usize],
        })
    }

    /// Number of categories this hypothesis allows.
    pub fn n(&self) -> u32 {
        self.params.len() as u32
    }

    /// Current concentration parameters.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Conjugate update: add observed counts to the concentrations.
    ///
    /// Counts beyond the parameter vector are a caller error the suite
    /// rejects up front; entries past `data` are untouched.
    pub fn update(&mut self, data: &[u32]) {
        for (p, &x) in self.params.iter_mut().zip(data) {
            *p += f64::from(x);
        }
    }

    /// Exact Beta marginal of coordinate `index`:
    /// `Beta(α_i, α_0 - α_i)` where `α_0 = Σ α_j`.
    pub fn marginal_beta(&self, index: usize) -> Result<Beta> {
        let alpha = self
            .params
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                limit: self.n(),
            })?;
        let total: f64 = self.params.iter().sum();
        Beta::new(alpha, total - alpha).ok_or_else(|| {
            Error::Numerical(format!("marginal Beta({alpha}, {}) invalid", total - alpha))
        })
    }

    /// One simplex sample: independent Gamma(α_i, 1) draws normalized by
    /// their sum.
    pub fn random(&self, rng: &mut StdRng) -> Result<Vec<f64>> {
        sample_simplex(&self.params, rng)
    }

    /// Single-draw Monte-Carlo likelihood estimate of `data`: evaluate the
    /// multinomial probability (up to the constant coefficient) at one
    /// simplex sample. Zero when the hypothesis has fewer categories than
    /// were observed. High variance, unbiased.
    pub fn likelihood(&self, rng: &mut StdRng, data: &[u32]) -> Result<f64> {
        if self.params.len() < data.len() {
            return Ok(0.0);
        }
        let ps = self.random(rng)?;
        let mut like = 1.0;
        for (p, &x) in ps.iter().zip(data) {
            like *= p.powi(x as i32);
        }
        Ok(like)
    }

    /// Log-domain single-draw estimate; NEG_INFINITY when infeasible.
    pub fn log_likelihood(&self, rng: &mut StdRng, data: &[u32]) -> Result<f64> {
        if self.params.len() < data.len() {
            return Ok(f64::NEG_INFINITY);
        }
        let ps = self.random(rng)?;
        Ok(ps
            .iter()
            .zip(data)
            .map(|(p, &x)| f64::from(x) * p.ln())
            .sum())
    }
}

/// Independent Gamma(shape, 1) draws, one per concentration.
pub(crate) fn sample_gammas(shapes: &[f64], rng: &mut StdRng) -> Result<Vec<f64>> {
    shapes
        .iter()
        .map(|&shape| {
            let gamma = Gamma::new(shape, 1.0)
                .map_err(|_| Error::Numerical(format!("gamma draw with shape {shape}")))?;
            Ok(gamma.sample(rng))
        })
        .collect()
}

/// Gamma draws normalized onto the probability simplex.
pub(crate) fn sample_simplex(shapes: &[f64], rng: &mut StdRng) -> Result<Vec<f64>> {
    let mut draws = sample_gammas(shapes, rng)?;
    let total: f64 = draws.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(Error::Numerical(format!(
            "simplex normalizer is {total}"
        )));
    }
    for d in &mut draws {
        *d /= total;
    }
    Ok(draws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    // =======================================================================
    // Construction and conjugate update
    // =======================================================================

    #[test]
    fn new_starts_flat() {
        let model = DirichletModel::new(4).unwrap();
        assert_eq!(model.params(), &[1.0, 1.0, 1.0, 1.0]);
        assert!(DirichletModel::new(0).is_none());
    }

    #[test]
    fn update_adds_counts_in_place() {
        let mut model = DirichletModel::new(5).unwrap();
        model.update(&[3, 2, 1]);
        assert_eq!(model.params(), &[4.0, 3.0, 2.0, 1.0, 1.0]);

        // a second batch keeps accumulating; trailing entries untouched
        model.update(&[1, 1]);
        assert_eq!(model.params(), &[5.0, 4.0, 2.0, 1.0, 1.0]);
    }

    // =======================================================================
    // Conjugacy exactness (closed form, no Monte-Carlo error)
    // =======================================================================

    #[test]
    fn marginals_after_classic_update_are_exact() {
        // 3 categories, data [3,2,1]: posterior Dirichlet([4,3,2]), α_0 = 9
        let mut model = DirichletModel::new(3).unwrap();
        model.update(&[3, 2, 1]);

        let expected = [(4.0, 5.0), (3.0, 6.0), (2.0, 7.0)];
        for (i, (alpha, beta)) in expected.iter().enumerate() {
            let marginal = model.marginal_beta(i).unwrap();
            assert!(approx_eq(marginal.alpha, *alpha, 1e-12));
            assert!(approx_eq(marginal.beta, *beta, 1e-12));
        }

        // means 4/9, 3/9, 2/9
        assert!(approx_eq(model.marginal_beta(0).unwrap().mean(), 4.0 / 9.0, 1e-12));
        assert!(approx_eq(model.marginal_beta(2).unwrap().mean(), 2.0 / 9.0, 1e-12));
    }

    #[test]
    fn marginal_index_out_of_range() {
        let model = DirichletModel::new(3).unwrap();
        assert!(matches!(
            model.marginal_beta(3),
            Err(Error::IndexOutOfRange { index: 3, limit: 3 })
        ));
    }

    // =======================================================================
    // Sampling
    // =======================================================================

    #[test]
    fn random_is_a_simplex_sample() {
        let model = DirichletModel::new(6).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let ps = model.random(&mut rng).unwrap();
            assert_eq!(ps.len(), 6);
            assert!(ps.iter().all(|p| *p > 0.0 && *p < 1.0));
            assert!(approx_eq(ps.iter().sum::<f64>(), 1.0, 1e-12));
        }
    }

    #[test]
    fn random_is_seed_reproducible() {
        let model = DirichletModel::new(4).unwrap();
        let a = model.random(&mut StdRng::seed_from_u64(99)).unwrap();
        let b = model.random(&mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn likelihood_zero_when_infeasible() {
        let model = DirichletModel::new(2).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let like = model.likelihood(&mut rng, &[3, 2, 1]).unwrap();
        assert_eq!(like, 0.0);
        let ll = model.log_likelihood(&mut rng, &[3, 2, 1]).unwrap();
        assert!(ll.is_infinite() && ll.is_sign_negative());
    }

    #[test]
    fn log_likelihood_matches_linear_estimate() {
        let model = DirichletModel::new(3).unwrap();
        let data = [3u32, 2, 1];
        let linear = model.likelihood(&mut StdRng::seed_from_u64(5), &data).unwrap();
        let logged = model
            .log_likelihood(&mut StdRng::seed_from_u64(5), &data)
            .unwrap();
        assert!(approx_eq(linear.ln(), logged, 1e-10));
    }

    #[test]
    fn averaged_likelihood_approaches_closed_form() {
        // E[Π p_i^x_i] under Dirichlet(1,1,1) with x=[3,2,1]:
        // Π x_i! * (n-1)! / (n-1+Σx)! = 12 * 2 / 40320 ≈ 5.952e-4
        let model = DirichletModel::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let draws = 20_000;
        let mut sum = 0.0;
        for _ in 0..draws {
            sum += model.likelihood(&mut rng, &[3, 2, 1]).unwrap();
        }
        let estimate = sum / draws as f64;
        let exact = 12.0 * 2.0 / 40_320.0;
        assert!(
            (estimate - exact).abs() / exact < 0.1,
            "estimate {estimate} vs exact {exact}"
        );
    }
}
