//! Baseline strategy: one independent Dirichlet model per candidate total.
//!
//! Correct and simple, at the cost of one full set of Gamma draws per
//! candidate per iteration. The batch likelihood for each candidate is the
//! average of single-draw estimates, aggregated in log domain, corrected by
//! the number of ways the observed categories could have been selected from
//! the candidate's total: `C(N, m)`.

use rand::rngs::StdRng;

use sc_math::{exp_scaled, log_binomial, log_sum_exp, Beta};

use crate::dirichlet::DirichletModel;
use crate::error::{Error, Result};

use super::Estimator;

pub struct PerHypothesis {
    models: Vec<DirichletModel>,
}

impl PerHypothesis {
    pub fn new(ns: &[u32]) -> Result<Self> {
        let models = ns
            .iter()
            .map(|&n| {
                DirichletModel::new(n).ok_or_else(|| {
                    Error::InvalidRange(format!("candidate N = {n} must be positive"))
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { models })
    }
}

impl Estimator for PerHypothesis {
    fn name(&self) -> &'static str {
        "per_hypothesis"
    }

    fn update(
        &mut self,
        _ns: &[u32],
        probs: &mut [f64],
        data: &[u32],
        iterations: usize,
        rng: &mut StdRng,
    ) -> Result<()> {
        let m = data.len() as u64;
        let mut log_likes = Vec::with_capacity(self.models.len());
        let mut draws = Vec::with_capacity(iterations);
        for model in &self.models {
            draws.clear();
            for _ in 0..iterations {
                draws.push(model.log_likelihood(rng, data)?);
            }
            let log_mean = log_sum_exp(&draws) - (iterations as f64).ln();
            log_likes.push(log_mean + log_binomial(u64::from(model.n()), m));
        }

        // rescale against the best candidate so no weight underflows
        let likes = exp_scaled(&log_likes);
        for (p, like) in probs.iter_mut().zip(&likes) {
            *p *= like;
        }

        for model in &mut self.models {
            model.update(data);
        }
        Ok(())
    }

    fn marginal(&self, n: u32, index: usize) -> Result<Beta> {
        let model = self
            .models
            .iter()
            .find(|model| model.n() == n)
            .ok_or_else(|| Error::InvalidRange(format!("no model for candidate N = {n}")))?;
        model.marginal_beta(index)
    }
}
