//! Property-based tests for the distribution containers.

use proptest::prelude::*;
use sc_core::{make_mixture, Pmf};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// normalize always leaves a unit total, whatever the weights were.
    #[test]
    fn normalize_yields_unit_total(weights in prop::collection::vec(0.001..100.0f64, 1..20)) {
        let mut pmf = Pmf::from_items(
            weights.iter().enumerate().map(|(i, w)| (i as u32, *w)),
        );
        pmf.normalize().unwrap();
        prop_assert!(approx_eq(pmf.total(), 1.0, 1e-9), "total {}", pmf.total());
    }

    /// A mixture's total mass is the weighted sum of its components' masses.
    #[test]
    fn mixture_mass_is_weighted_component_mass(
        a_weights in prop::collection::vec(0.01..10.0f64, 1..8),
        b_weights in prop::collection::vec(0.01..10.0f64, 1..8),
        mix_a in 0.01..1.0f64,
        mix_b in 0.01..1.0f64,
    ) {
        let a = Pmf::from_items(a_weights.iter().enumerate().map(|(i, w)| (i as u32, *w)));
        let b = Pmf::from_items(b_weights.iter().enumerate().map(|(i, w)| (i as u32, *w)));
        let expected = a.total() * mix_a + b.total() * mix_b;
        let mix = make_mixture(&[(a, mix_a), (b, mix_b)]);
        prop_assert!(approx_eq(mix.total(), expected, 1e-9),
            "mixture total {} expected {}", mix.total(), expected);
    }

    /// Percentiles are monotone in p.
    #[test]
    fn percentile_monotone(
        weights in prop::collection::vec(0.01..10.0f64, 2..15),
        p_low in 0.0..0.5f64,
        gap in 0.0..0.5f64,
    ) {
        let pmf = Pmf::from_items(weights.iter().enumerate().map(|(i, w)| (i as u32, *w)));
        let low = pmf.percentile(p_low).unwrap();
        let high = pmf.percentile(p_low + gap).unwrap();
        prop_assert!(low <= high, "percentile({}) = {} > percentile({}) = {}",
            p_low, low, p_low + gap, high);
    }
}
