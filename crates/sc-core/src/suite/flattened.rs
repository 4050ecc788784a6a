//! Vectorized strategy: one shared concentration array for all candidates.
//!
//! A single Gamma draw over the longest candidate's concentrations serves
//! every hypothesis at once: the cumulative sum sliced at each candidate's
//! boundary yields that candidate's normalizer. One pass per iteration
//! instead of one per candidate, at the cost of correlated randomness across
//! hypotheses within a draw (harmless once draws are averaged).
//!
//! Per-draw log-likelihoods are rescaled against their maximum before
//! exponentiating, then corrected by `C(N, m)` per candidate.

use rand::rngs::StdRng;

use sc_math::{exp_scaled, log_binomial, Beta};

use crate::dirichlet::sample_gammas;
use crate::error::{Error, Result};

use super::{shared_marginal, Estimator};

pub struct Flattened {
    params: Vec<f64>,
}

impl Flattened {
    pub fn new(ns: &[u32]) -> Result<Self> {
        let longest = *ns
            .last()
            .ok_or_else(|| Error::InvalidRange("candidate range is empty".into()))?;
        if longest == 0 {
            return Err(Error::InvalidRange(
                "candidate totals must be positive".into(),
            ));
        }
        Ok(Self {
            params: vec![1.0; longest as usize],
        })
    }

    /// Concentration array shared across candidates; the first-m entries
    /// grow monotonically as batches arrive.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Likelihood ratios for every candidate from one shared draw.
    fn sample_likelihood(&self, ns: &[u32], data: &[u32], rng: &mut StdRng) -> Result<Vec<f64>> {
        let gammas = sample_gammas(&self.params, rng)?;
        let mut cum = Vec::with_capacity(gammas.len());
        let mut acc = 0.0;
        for g in &gammas {
            acc += g;
            cum.push(acc);
        }

        let m = data.len() as u64;
        let mut log_likes = Vec::with_capacity(ns.len());
        for &n in ns {
            let normalizer = cum[n as usize - 1];
            let log_like: f64 = data
                .iter()
                .enumerate()
                .map(|(i, &x)| f64::from(x) * (gammas[i] / normalizer).ln())
                .sum();
            log_likes.push(log_like);
        }

        let mut likes = exp_scaled(&log_likes);
        for (like, &n) in likes.iter_mut().zip(ns) {
            *like *= log_binomial(u64::from(n), m).exp();
        }
        Ok(likes)
    }
}

impl Estimator for Flattened {
    fn name(&self) -> &'static str {
        "flattened"
    }

    fn update(
        &mut self,
        ns: &[u32],
        probs: &mut [f64],
        data: &[u32],
        iterations: usize,
        rng: &mut StdRng,
    ) -> Result<()> {
        let mut accumulated = vec![0.0; ns.len()];
        for _ in 0..iterations {
            let likes = self.sample_likelihood(ns, data, rng)?;
            for (acc, like) in accumulated.iter_mut().zip(&likes) {
                *acc += like;
            }
        }
        for (p, acc) in probs.iter_mut().zip(&accumulated) {
            *p *= acc;
        }

        for (param, &x) in self.params.iter_mut().zip(data) {
            *param += f64::from(x);
        }
        Ok(())
    }

    fn marginal(&self, n: u32, index: usize) -> Result<Beta> {
        shared_marginal(&self.params, n, index)
    }
}
