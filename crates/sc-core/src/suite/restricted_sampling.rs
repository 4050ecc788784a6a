//! Restricted-sampling strategy: the baseline per-candidate update backed by
//! importance-restricted Dirichlet models.
//!
//! Every candidate's model is peeked with the incoming batch first, so its
//! draws concentrate where the posterior will live; the restriction weight
//! baked into each model's likelihood keeps the estimates comparable across
//! candidates.

use rand::rngs::StdRng;

use sc_math::{exp_scaled, log_binomial, log_sum_exp, Beta};

use crate::error::{Error, Result};
use crate::restricted::RestrictedDirichlet;

use super::Estimator;

pub struct RestrictedSampling {
    models: Vec<RestrictedDirichlet>,
}

impl RestrictedSampling {
    pub fn new(ns: &[u32]) -> Result<Self> {
        let models = ns
            .iter()
            .map(|&n| {
                RestrictedDirichlet::new(n).ok_or_else(|| {
                    Error::InvalidRange(format!("candidate N = {n} must be positive"))
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self { models })
    }
}

impl Estimator for RestrictedSampling {
    fn name(&self) -> &'static str {
        "restricted_sampling"
    }

    fn update(
        &mut self,
        _ns: &[u32],
        probs: &mut [f64],
        data: &[u32],
        iterations: usize,
        rng: &mut StdRng,
    ) -> Result<()> {
        for model in &mut self.models {
            model.peek(data)?;
        }

        let m = data.len() as u64;
        let mut log_likes = Vec::with_capacity(self.models.len());
        let mut draws = Vec::with_capacity(iterations);
        for model in &self.models {
            draws.clear();
            for _ in 0..iterations {
                draws.push(model.likelihood(rng, data)?.ln());
            }
            let log_mean = log_sum_exp(&draws) - (iterations as f64).ln();
            log_likes.push(log_mean + log_binomial(u64::from(model.n()), m));
        }

        let likes = exp_scaled(&log_likes);
        for (p, like) in probs.iter_mut().zip(&likes) {
            *p *= like;
        }

        for model in &mut self.models {
            model.update(data)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn update_peeks_then_commits() {
        let ns = [3u32, 4, 5];
        let mut estimator = RestrictedSampling::new(&ns).unwrap();
        let mut probs = vec![1.0 / 3.0; 3];
        let mut rng = StdRng::seed_from_u64(17);

        estimator
            .update(&ns, &mut probs, &[3, 2, 1], 100, &mut rng)
            .unwrap();
        assert!(probs.iter().any(|p| *p > 0.0));

        // the peek was consumed, so a second batch goes through cleanly
        estimator
            .update(&ns, &mut probs, &[1, 1, 1], 100, &mut rng)
            .unwrap();
    }

    #[test]
    fn committed_marginals_match_the_conjugate_update() {
        let ns = [3u32, 6];
        let mut estimator = RestrictedSampling::new(&ns).unwrap();
        let mut probs = vec![0.5; 2];
        let mut rng = StdRng::seed_from_u64(17);
        estimator
            .update(&ns, &mut probs, &[3, 2, 1], 50, &mut rng)
            .unwrap();

        let marginal = estimator.marginal(3, 0).unwrap();
        assert_eq!((marginal.alpha, marginal.beta), (4.0, 5.0));
    }
}
