//! Species Census core: hierarchical Bayesian estimation of how many
//! categories a population holds, from the partial counts one sample showed.
//!
//! The outer layer is a discrete posterior over candidate totals N; the
//! inner layer is a Dirichlet-multinomial model of category prevalences per
//! candidate. Likelihoods are Monte-Carlo estimates from seeded Gamma draws,
//! aggregated in log domain. Four estimation strategies trade correctness,
//! speed, and numerical stability; all expose the same posterior queries.
//!
//! ```
//! use sc_core::{make_posterior, SuiteConfig, Variant};
//!
//! let config = SuiteConfig::new(Variant::Flattened, (3..15).collect(), 500, 17);
//! let posterior = make_posterior(&config, &[3, 2, 1]).unwrap();
//! assert!(posterior.mode().is_some());
//! ```

pub mod config;
pub mod dirichlet;
pub mod error;
pub mod pmf;
pub mod restricted;
pub mod subject;
pub mod suite;

pub use config::{candidate_range, make_posterior, SuiteConfig, Variant};
pub use dirichlet::DirichletModel;
pub use error::{Error, Result};
pub use pmf::{beta_pmf, make_mixture, Cdf, Pmf};
pub use restricted::RestrictedDirichlet;
pub use subject::Subject;
pub use suite::{Estimator, SpeciesSuite};
