//! Incremental strategy: fold the batch in one category at a time.
//!
//! Each step reveals the next observed category in discovery order and
//! multiplies in the unseen-species factor `(N - m + 1)`: the number of
//! still-unseen categories the newly revealed one could have been, with m
//! categories known so far under candidate total N. Applying the correction
//! once per category rather than once per batch is a distinct model, not an
//! approximation of the batch variants; kept as such deliberately.
//!
//! Outer weights are renormalized after every step so a long batch cannot
//! drive them to underflow mid-update.

use rand::rngs::StdRng;

use sc_math::{exp_scaled, Beta};

use crate::dirichlet::sample_gammas;
use crate::error::{Error, Result};

use super::{shared_marginal, Estimator};

pub struct Incremental {
    params: Vec<f64>,
}

impl Incremental {
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

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Likelihood ratios for one revealed category across all candidates,
    /// from a single shared draw: `p_step ^ count` where `p_step` is the
    /// step'th coordinate normalized by each candidate's prefix sum.
    fn sample_step(
        &self,
        ns: &[u32],
        step: usize,
        count: u32,
        rng: &mut StdRng,
    ) -> Result<Vec<f64>> {
        let gammas = sample_gammas(&self.params, rng)?;
        let mut cum = Vec::with_capacity(gammas.len());
        let mut acc = 0.0;
        for g in &gammas {
            acc += g;
            cum.push(acc);
        }

        let revealed = gammas[step - 1];
        let log_likes: Vec<f64> = ns
            .iter()
            .map(|&n| f64::from(count) * (revealed / cum[n as usize - 1]).ln())
            .collect();
        Ok(exp_scaled(&log_likes))
    }

    /// One category's weighted update across all candidates.
    fn update_one(
        &self,
        ns: &[u32],
        probs: &mut [f64],
        step: usize,
        count: u32,
        iterations: usize,
        rng: &mut StdRng,
    ) -> Result<()> {
        let mut accumulated = vec![0.0; ns.len()];
        for _ in 0..iterations {
            let likes = self.sample_step(ns, step, count, rng)?;
            for (acc, like) in accumulated.iter_mut().zip(&likes) {
                *acc += like;
            }
        }

        for ((p, acc), &n) in probs.iter_mut().zip(&accumulated).zip(ns) {
            let unseen = f64::from(n) - step as f64 + 1.0;
            *p *= acc * unseen;
        }

        let total: f64 = probs.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::DegenerateNormalization(format!(
                "weights sum to {total} after revealing category {step}"
            )));
        }
        for p in probs.iter_mut() {
            *p /= total;
        }
        Ok(())
    }
}

impl Estimator for Incremental {
    fn name(&self) -> &'static str {
        "incremental"
    }

    fn update(
        &mut self,
        ns: &[u32],
        probs: &mut [f64],
        data: &[u32],
        iterations: usize,
        rng: &mut StdRng,
    ) -> Result<()> {
        for (i, &count) in data.iter().enumerate() {
            self.update_one(ns, probs, i + 1, count, iterations, rng)?;
            self.params[i] += f64::from(count);
        }
        Ok(())
    }

    fn marginal(&self, n: u32, index: usize) -> Result<Beta> {
        shared_marginal(&self.params, n, index)
    }
}
