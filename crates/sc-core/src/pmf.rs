//! Discrete probability mass functions and their cumulative form.
//!
//! `Pmf` is the container every layer of the hierarchy speaks: the outer
//! distribution over candidate species totals, discretized Beta marginals,
//! and the mixtures that blend them. Normalization is an explicit operation,
//! never automatic; a zero-mass distribution is an error the caller sees.

use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

use sc_math::Beta;

use crate::error::{Error, Result};

/// Value types usable as support points: candidate totals (`u32`) and
/// prevalences (`f64`).
pub trait PmfValue: Copy + PartialEq + PartialOrd {}
impl<T: Copy + PartialEq + PartialOrd> PmfValue for T {}

fn cmp_values<V: PartialOrd>(a: &V, b: &V) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// A discrete distribution: support values with non-negative weights.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pmf<V> {
    items: Vec<(V, f64)>,
}

impl<V: PmfValue> Pmf<V> {
    /// An empty distribution.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from (value, weight) pairs; duplicate values accumulate.
    pub fn from_items(items: impl IntoIterator<Item = (V, f64)>) -> Self {
        let mut pmf = Self::new();
        for (v, w) in items {
            pmf.incr(v, w);
        }
        pmf
    }

    /// Set the weight of `value`, inserting it if absent.
    pub fn set(&mut self, value: V, weight: f64) {
        match self.items.iter_mut().find(|(v, _)| *v == value) {
            Some((_, w)) => *w = weight,
            None => self.items.push((value, weight)),
        }
    }

    /// Add `delta` to the weight of `value`, inserting it if absent.
    pub fn incr(&mut self, value: V, delta: f64) {
        match self.items.iter_mut().find(|(v, _)| *v == value) {
            Some((_, w)) => *w += delta,
            None => self.items.push((value, delta)),
        }
    }

    /// Multiply the weight of `value` by `factor`; absent values stay absent.
    pub fn mult(&mut self, value: V, factor: f64) {
        if let Some((_, w)) = self.items.iter_mut().find(|(v, _)| *v == value) {
            *w *= factor;
        }
    }

    /// Remove `value`, returning its weight if it was present.
    pub fn remove(&mut self, value: V) -> Option<f64> {
        let idx = self.items.iter().position(|(v, _)| *v == value)?;
        Some(self.items.swap_remove(idx).1)
    }

    /// Weight of `value`, 0 if absent.
    pub fn prob(&self, value: V) -> f64 {
        self.items
            .iter()
            .find(|(v, _)| *v == value)
            .map_or(0.0, |(_, w)| *w)
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.items.iter().map(|(_, w)| w).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over support values (order irrelevant).
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.items.iter().map(|(v, _)| *v)
    }

    /// (value, weight) pairs (order irrelevant).
    pub fn items(&self) -> &[(V, f64)] {
        &self.items
    }

    /// Divide every weight by the total so weights sum to 1; idempotent.
    ///
    /// Returns the total before dividing. A zero or non-finite total is a
    /// degenerate distribution and is surfaced, never silently repaired.
    pub fn normalize(&mut self) -> Result<f64> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::DegenerateNormalization(format!(
                "pmf total is {total}"
            )));
        }
        for (_, w) in &mut self.items {
            *w /= total;
        }
        Ok(total)
    }

    /// Value with the largest weight (the mode), if any.
    pub fn mode(&self) -> Option<V> {
        self.items
            .iter()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .map(|(v, _)| *v)
    }

    /// Value at cumulative fraction `p` of the total weight, scanning in
    /// ascending value order.
    pub fn percentile(&self, p: f64) -> Option<V> {
        if self.items.is_empty() {
            return None;
        }
        let sorted = self.sorted_items();
        let threshold = p.clamp(0.0, 1.0) * self.total();
        let mut cum = 0.0;
        for (v, w) in &sorted {
            cum += w;
            if cum >= threshold {
                return Some(*v);
            }
        }
        sorted.last().map(|(v, _)| *v)
    }

    fn sorted_items(&self) -> Vec<(V, f64)> {
        let mut sorted = self.items.clone();
        sorted.sort_by(|(a, _), (b, _)| cmp_values(a, b));
        sorted
    }
}

impl<V: PmfValue + Into<f64>> Pmf<V> {
    /// Weight-averaged mean of the support.
    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return f64::NAN;
        }
        self.items
            .iter()
            .map(|(v, w)| (*v).into() * w)
            .sum::<f64>()
            / total
    }
}

/// Blend component distributions into one flat Pmf.
///
/// Each component's weights are multiplied by its mixing weight, then summed
/// pointwise across components. The result is NOT renormalized: mixing
/// `{A: 0.6}` and `{B: 0.4}` each at weight 0.5 yields `{A: 0.3, B: 0.2}`.
pub fn make_mixture<V: PmfValue>(components: &[(Pmf<V>, f64)]) -> Pmf<V> {
    let mut pooled: Vec<(V, f64)> = Vec::new();
    for (pmf, weight) in components {
        for (v, w) in pmf.items() {
            pooled.push((*v, w * weight));
        }
    }
    pooled.sort_by(|(a, _), (b, _)| cmp_values(a, b));

    let mut mix = Pmf::new();
    let mut pending: Option<(V, f64)> = None;
    for (v, w) in pooled {
        match pending {
            Some((pv, pw)) if pv == v => pending = Some((pv, pw + w)),
            Some((pv, pw)) => {
                mix.items.push((pv, pw));
                pending = Some((v, w));
            }
            None => pending = Some((v, w)),
        }
    }
    if let Some(last) = pending {
        mix.items.push(last);
    }
    mix
}

/// Discretize a Beta distribution onto an evenly spaced grid over [0, 1].
///
/// Grid points where the density vanishes or diverges are dropped; the
/// result is normalized. Engine concentrations never drop below 1, so the
/// endpoint densities stay finite here.
pub fn beta_pmf(beta: &Beta, steps: usize) -> Result<Pmf<f64>> {
    if steps < 2 {
        return Err(Error::Numerical(format!(
            "beta discretization needs at least 2 steps, got {steps}"
        )));
    }
    let denom = (steps - 1) as f64;
    let mut pmf = Pmf::new();
    for i in 0..steps {
        let x = i as f64 / denom;
        let density = beta.pdf(x);
        if density.is_finite() && density > 0.0 {
            pmf.incr(x, density);
        }
    }
    pmf.normalize().map_err(|_| {
        Error::DegenerateNormalization(format!(
            "Beta({}, {}) density vanished on a {steps}-point grid",
            beta.alpha, beta.beta
        ))
    })?;
    Ok(pmf)
}

/// Cumulative form of a Pmf: ascending values with running totals scaled
/// to end at 1. Supports quantile queries and random draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cdf<V> {
    values: Vec<V>,
    cum: Vec<f64>,
}

impl<V: PmfValue> Cdf<V> {
    /// Build from a Pmf; fails on a zero-mass distribution.
    pub fn from_pmf(pmf: &Pmf<V>) -> Result<Self> {
        let total = pmf.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::DegenerateNormalization(format!(
                "cdf source total is {total}"
            )));
        }
        let sorted = pmf.sorted_items();
        let mut values = Vec::with_capacity(sorted.len());
        let mut cum = Vec::with_capacity(sorted.len());
        let mut acc = 0.0;
        for (v, w) in sorted {
            acc += w / total;
            values.push(v);
            cum.push(acc);
        }
        if let Some(last) = cum.last_mut() {
            *last = 1.0;
        }
        Ok(Self { values, cum })
    }

    /// Smallest value whose cumulative probability reaches `p`.
    pub fn percentile(&self, p: f64) -> V {
        let p = p.clamp(0.0, 1.0);
        let idx = self.cum.partition_point(|c| *c < p);
        self.values[idx.min(self.values.len() - 1)]
    }

    /// Draw a value with probability proportional to its mass.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> V {
        let u: f64 = rng.random();
        self.percentile(u)
    }
}
