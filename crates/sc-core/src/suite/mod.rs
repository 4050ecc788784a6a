//! Hierarchical suite over candidate species totals.
//!
//! The outer layer is a discrete distribution over candidate totals N; the
//! inner layer is Dirichlet-multinomial state whose shape depends on the
//! estimation strategy. Updates multiply Monte-Carlo likelihood estimates
//! into the outer weights and fold the batch into the inner concentrations.
//!
//! The historical lineage had six near-identical suite variants; here they
//! are one suite parameterized by a pluggable likelihood-estimation strategy.

mod flattened;
mod incremental;
mod per_hypothesis;
mod restricted_sampling;

pub use flattened::Flattened;
pub use incremental::Incremental;
pub use per_hypothesis::PerHypothesis;
pub use restricted_sampling::RestrictedSampling;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use sc_math::Beta;

use crate::error::{Error, Result};
use crate::pmf::{beta_pmf, make_mixture, Pmf};

/// Grid resolution for prevalence marginals.
const PREVALENCE_STEPS: usize = 101;

/// A likelihood-estimation strategy: owns the inner Dirichlet state for all
/// candidate totals and knows how to fold one observed batch into it.
pub trait Estimator {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Multiply each candidate's estimated batch likelihood into `probs`
    /// (left unnormalized for the suite to renormalize) and commit the batch
    /// to the inner concentration state.
    fn update(
        &mut self,
        ns: &[u32],
        probs: &mut [f64],
        data: &[u32],
        iterations: usize,
        rng: &mut StdRng,
    ) -> Result<()>;

    /// Beta marginal of category `index` under candidate total `n`.
    fn marginal(&self, n: u32, index: usize) -> Result<Beta>;
}

/// Posterior over candidate species totals, with per-candidate prevalence
/// marginals.
pub struct SpeciesSuite {
    ns: Vec<u32>,
    probs: Vec<f64>,
    iterations: usize,
    rng: StdRng,
    estimator: Box<dyn Estimator>,
}

impl SpeciesSuite {
    /// Assemble a suite from a validated candidate range and a strategy.
    /// The prior over candidates is uniform.
    pub fn with_estimator(
        ns: Vec<u32>,
        iterations: usize,
        seed: u64,
        estimator: Box<dyn Estimator>,
    ) -> Result<Self> {
        validate_candidates(&ns)?;
        if iterations == 0 {
            return Err(Error::InvalidRange(
                "iteration count must be positive".into(),
            ));
        }
        let uniform = 1.0 / ns.len() as f64;
        Ok(Self {
            probs: vec![uniform; ns.len()],
            ns,
            iterations,
            rng: StdRng::seed_from_u64(seed),
            estimator,
        })
    }

    /// Candidate totals, ascending.
    pub fn ns(&self) -> &[u32] {
        &self.ns
    }

    /// Current normalized weights, parallel to `ns()`.
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Incorporate one batch of observed category counts.
    ///
    /// Every candidate total must cover the observed categories; an
    /// infeasible range is rejected before any state mutates. A weight
    /// vector that collapses to zero is surfaced, never treated as uniform.
    pub fn update(&mut self, data: &[u32]) -> Result<()> {
        let m = data.len();
        if m == 0 {
            return Ok(());
        }
        if let Some(&n) = self.ns.iter().find(|&&n| (n as usize) < m) {
            return Err(Error::InvalidRange(format!(
                "candidate N = {n} is below the {m} observed categories"
            )));
        }

        debug!(
            strategy = self.estimator.name(),
            observed = m,
            iterations = self.iterations,
            "updating suite"
        );
        self.estimator.update(
            &self.ns,
            &mut self.probs,
            data,
            self.iterations,
            &mut self.rng,
        )?;

        let total: f64 = self.probs.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(Error::DegenerateNormalization(format!(
                "posterior over N sums to {total}"
            )));
        }
        for p in &mut self.probs {
            *p /= total;
        }
        Ok(())
    }

    /// Posterior distribution over candidate totals.
    pub fn dist_of_n(&self) -> Pmf<u32> {
        Pmf::from_items(self.ns.iter().copied().zip(self.probs.iter().copied()))
    }

    /// Marginal prevalence of one category: its Beta marginal under each
    /// candidate total, mixed by the posterior over totals.
    pub fn dist_of_prevalence(&self, index: usize) -> Result<Pmf<f64>> {
        let smallest = self.ns[0];
        if index as u64 >= u64::from(smallest) {
            return Err(Error::IndexOutOfRange {
                index,
                limit: smallest,
            });
        }
        let mut components = Vec::with_capacity(self.ns.len());
        for (&n, &prob) in self.ns.iter().zip(&self.probs) {
            let marginal = self.estimator.marginal(n, index)?;
            components.push((beta_pmf(&marginal, PREVALENCE_STEPS)?, prob));
        }
        let mut mixed = make_mixture(&components);
        mixed.normalize()?;
        Ok(mixed)
    }
}

/// Candidate ranges must be non-empty, positive, and strictly ascending
/// (the shared-array strategies slice cumulative sums at each candidate).
pub(crate) fn validate_candidates(ns: &[u32]) -> Result<()> {
    if ns.is_empty() {
        return Err(Error::InvalidRange("candidate range is empty".into()));
    }
    if ns[0] == 0 {
        return Err(Error::InvalidRange(
            "candidate totals must be positive".into(),
        ));
    }
    if ns.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::InvalidRange(
            "candidate totals must be strictly ascending".into(),
        ));
    }
    Ok(())
}

/// Marginal of one coordinate in a shared concentration array sliced at
/// candidate total `n`: `Beta(α_i, Σ_{j<n} α_j - α_i)`.
pub(crate) fn shared_marginal(params: &[f64], n: u32, index: usize) -> Result<Beta> {
    let n = n as usize;
    if n > params.len() {
        return Err(Error::InvalidRange(format!(
            "candidate N = {n} exceeds shared array length {}",
            params.len()
        )));
    }
    if index >= n {
        return Err(Error::IndexOutOfRange {
            index,
            limit: n as u32,
        });
    }
    let total: f64 = params[..n].iter().sum();
    let alpha = params[index];
    Beta::new(alpha, total - alpha).ok_or_else(|| {
        Error::Numerical(format!("marginal Beta({alpha}, {}) invalid", total - alpha))
    })
}
