//! Importance-restricted Dirichlet sampling.
//!
//! For large candidate totals the flat prior spreads most simplex volume
//! over regions the posterior will never visit, so naive draws waste effort.
//! This sampler peeks at what the posterior marginals would look like after
//! the incoming batch, restricts each stick-breaking conditional to the
//! 2nd-98th percentile band of its would-be posterior, and records the
//! retained prior mass as an importance weight so restricted likelihoods
//! stay proportional to unrestricted ones.
//!
//! Contract: `peek` exactly once per data batch, before `likelihood` or
//! `update`. There is no incremental single-step update path; the trimmed
//! conditionals are only valid for the batch they were peeked with.

use rand::rngs::StdRng;

use sc_math::Beta;

use crate::dirichlet::DirichletModel;
use crate::error::{Error, Result};
use crate::pmf::{beta_pmf, Cdf, Pmf};

/// Lower edge of the posterior inclusion band.
const INCLUSION_LOW: f64 = 0.02;
/// Upper edge of the posterior inclusion band.
const INCLUSION_HIGH: f64 = 0.98;
/// Grid resolution for the discretized conditionals.
const CONDITIONAL_STEPS: usize = 101;

/// Dirichlet model whose draws are confined to a peeked high-probability
/// region, with a compensating importance weight.
#[derive(Debug, Clone)]
pub struct RestrictedDirichlet {
    model: DirichletModel,
    conditionals: Vec<Cdf<f64>>,
    weight: f64,
    peeked: bool,
}

impl RestrictedDirichlet {
    /// Flat prior over `n` categories. Returns None for n = 0.
    pub fn new(n: u32) -> Option<Self> {
        Some(Self {
            model: DirichletModel::new(n)?,
            conditionals: Vec::new(),
            weight: 1.0,
            peeked: false,
        })
    }

    pub fn n(&self) -> u32 {
        self.model.n()
    }

    /// Probability mass of the restricted region (product of per-coordinate
    /// inclusion factors). 1 before the first peek.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Exact Beta marginal of coordinate `index` (restriction does not
    /// change the committed posterior state).
    pub fn marginal_beta(&self, index: usize) -> Result<Beta> {
        self.model.marginal_beta(index)
    }

    /// Locate the non-negligible posterior region for the incoming batch and
    /// trim the prior stick-breaking conditionals to it.
    pub fn peek(&mut self, data: &[u32]) -> Result<()> {
        if self.peeked {
            return Err(Error::PeekContract("twice for the same batch"));
        }

        let params = self.model.params();
        let priors = stick_conditionals(params)?;
        let mut tables: Vec<Pmf<f64>> = priors
            .iter()
            .map(|beta| beta_pmf(beta, CONDITIONAL_STEPS))
            .collect::<Result<_>>()?;

        // Would-be posterior after this batch, not committed.
        let mut posterior = params.to_vec();
        for (p, &x) in posterior.iter_mut().zip(data) {
            *p += f64::from(x);
        }
        let marginals = coordinate_marginals(&posterior, tables.len())?;

        let mut weight = 1.0;
        for (table, marginal) in tables.iter_mut().zip(&marginals) {
            let low = marginal.percentile(INCLUSION_LOW);
            let high = marginal.percentile(INCLUSION_HIGH);
            weight *= trim_table(table, low, high)?;
        }

        self.conditionals = tables
            .iter()
            .map(Cdf::from_pmf)
            .collect::<Result<_>>()?;
        self.weight = weight;
        self.peeked = true;
        Ok(())
    }

    /// Stick-breaking draw from the trimmed conditionals.
    pub fn random(&self, rng: &mut StdRng) -> Result<Vec<f64>> {
        if !self.peeked {
            return Err(Error::PeekContract("never; sample after peeking"));
        }
        let n = self.model.n() as usize;
        let mut ps = vec![0.0; n];
        let mut remaining = 1.0;
        for (i, conditional) in self.conditionals.iter().enumerate() {
            let p = conditional.random(rng);
            ps[i] = p * remaining;
            remaining *= 1.0 - p;
        }
        ps[n - 1] = remaining;
        Ok(ps)
    }

    /// Single-draw likelihood estimate from the restricted sampler, scaled
    /// by the inclusion weight to compensate for the narrowed domain.
    pub fn likelihood(&self, rng: &mut StdRng, data: &[u32]) -> Result<f64> {
        if (self.model.n() as usize) < data.len() {
            return Ok(0.0);
        }
        let ps = self.random(rng)?;
        let mut like = self.weight;
        for (p, &x) in ps.iter().zip(data) {
            like *= p.powi(x as i32);
        }
        Ok(like)
    }

    /// Conjugate update; consumes the peek for this batch.
    pub fn update(&mut self, data: &[u32]) -> Result<()> {
        if !self.peeked {
            return Err(Error::PeekContract("never; update after peeking"));
        }
        self.model.update(data);
        self.peeked = false;
        Ok(())
    }
}

/// Stick-breaking conditionals of a Dirichlet: coordinate i given survival
/// of the stick after coordinates 0..i are removed. n-1 of them.
fn stick_conditionals(params: &[f64]) -> Result<Vec<Beta>> {
    let mut remaining: f64 = params.iter().sum();
    let mut out = Vec::with_capacity(params.len().saturating_sub(1));
    for &x in &params[..params.len() - 1] {
        remaining -= x;
        let beta = Beta::new(x, remaining).ok_or_else(|| {
            Error::Numerical(format!("stick conditional Beta({x}, {remaining}) invalid"))
        })?;
        out.push(beta);
    }
    Ok(out)
}

/// Coordinate marginals `Beta(α_i, α_0 - α_i)` for the first `count`
/// coordinates.
fn coordinate_marginals(params: &[f64], count: usize) -> Result<Vec<Beta>> {
    let total: f64 = params.iter().sum();
    params[..count]
        .iter()
        .map(|&x| {
            Beta::new(x, total - x).ok_or_else(|| {
                Error::Numerical(format!("marginal Beta({x}, {}) invalid", total - x))
            })
        })
        .collect()
}

/// Drop grid values outside [low, high] and renormalize, returning the
/// retained probability mass.
fn trim_table(table: &mut Pmf<f64>, low: f64, high: f64) -> Result<f64> {
    let outside: Vec<f64> = table
        .values()
        .filter(|v| *v < low || *v > high)
        .collect();
    for v in outside {
        table.remove(v);
    }
    table.normalize().map_err(|_| {
        Error::DegenerateNormalization(format!(
            "conditional table trimmed to zero mass on [{low}, {high}]"
        ))
    })
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

    #[test]
    fn peek_contract_is_enforced() {
        let mut model = RestrictedDirichlet::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        // sampling and updating before any peek are misuse
        assert!(matches!(
            model.random(&mut rng),
            Err(Error::PeekContract(_))
        ));
        assert!(matches!(model.update(&[1]), Err(Error::PeekContract(_))));

        model.peek(&[3, 2, 1]).unwrap();
        assert!(matches!(
            model.peek(&[3, 2, 1]),
            Err(Error::PeekContract(_))
        ));

        // update consumes the peek, re-arming it for the next batch
        model.update(&[3, 2, 1]).unwrap();
        assert!(model.peek(&[1, 1, 1]).is_ok());
    }

    #[test]
    fn peek_produces_a_weight_in_unit_interval() {
        let mut model = RestrictedDirichlet::new(5).unwrap();
        model.peek(&[3, 2, 1]).unwrap();
        let w = model.weight();
        assert!(w > 0.0 && w <= 1.0, "weight was {w}");
    }

    #[test]
    fn restricted_draws_stay_on_the_simplex() {
        let mut model = RestrictedDirichlet::new(4).unwrap();
        model.peek(&[4, 2, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..100 {
            let ps = model.random(&mut rng).unwrap();
            assert_eq!(ps.len(), 4);
            assert!(ps.iter().all(|p| (0.0..=1.0).contains(p)));
            assert!(approx_eq(ps.iter().sum::<f64>(), 1.0, 1e-9));
        }
    }

    #[test]
    fn likelihood_is_weight_scaled() {
        let mut model = RestrictedDirichlet::new(3).unwrap();
        model.peek(&[3, 2, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let like = model.likelihood(&mut rng, &[3, 2, 1]).unwrap();
        assert!(like > 0.0);
        // a single multinomial term can never exceed 1, so neither can the
        // weighted estimate
        assert!(like <= model.weight());
    }

    #[test]
    fn likelihood_zero_when_infeasible() {
        let mut model = RestrictedDirichlet::new(2).unwrap();
        model.peek(&[1, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        assert_eq!(model.likelihood(&mut rng, &[1, 1, 1]).unwrap(), 0.0);
    }

    #[test]
    fn update_commits_the_posterior() {
        let mut model = RestrictedDirichlet::new(3).unwrap();
        model.peek(&[3, 2, 1]).unwrap();
        model.update(&[3, 2, 1]).unwrap();
        let marginal = model.marginal_beta(0).unwrap();
        assert!(approx_eq(marginal.alpha, 4.0, 1e-12));
        assert!(approx_eq(marginal.beta, 5.0, 1e-12));
    }

    #[test]
    fn conditional_count_is_n_minus_one() {
        let mut model = RestrictedDirichlet::new(6).unwrap();
        model.peek(&[2, 1]).unwrap();
        assert_eq!(model.conditionals.len(), 5);
    }
}
