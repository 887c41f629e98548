use std::collections::BTreeMap;

use rand::Rng;
use skylark_shared::{BaggageAllowance, BaggagePolicy, ExtraPricing};

use crate::fares::next_rung;

/// Chance that any given configured extra is offered on a leg.
const EXTRA_OFFER_PROBABILITY: f64 = 0.75;

const BASE_EXTRA_DOLLARS: std::ops::RangeInclusive<u32> = 5..=50;
const BASE_EXTRA_FFMS: std::ops::RangeInclusive<u32> = 400..=2_000;

const CHECKED_BAG_MAX: std::ops::RangeInclusive<u32> = 1..=4;
const CARRY_ON_MAX: std::ops::RangeInclusive<u32> = 1..=2;
const FIRST_CHECKED_BAG_DOLLARS: std::ops::RangeInclusive<u32> = 15..=45;
const FIRST_CARRY_ON_DOLLARS: std::ops::RangeInclusive<u32> = 10..=30;

/// Draws the offered subset of the configured extras, each with a 75%
/// independent chance, pricing them on an escalating ladder (up to 2.5x the
/// previous offered extra) in the reference record's order.
pub fn build_extras<R: Rng>(rng: &mut R, names: &[String]) -> BTreeMap<String, ExtraPricing> {
    let mut extras = BTreeMap::new();
    let mut dollars = 0;
    let mut ffms = 0;
    for name in names {
        if !rng.gen_bool(EXTRA_OFFER_PROBABILITY) {
            continue;
        }
        dollars = next_rung(rng, dollars, BASE_EXTRA_DOLLARS, 5, 2);
        ffms = next_rung(rng, ffms, BASE_EXTRA_FFMS, 5, 2);
        extras.insert(
            name.clone(),
            ExtraPricing {
                price_dollars: dollars,
                price_ffms: ffms,
            },
        );
    }
    extras
}

/// Checked and carry-on allowances with greedy per-item price lists: every
/// additional bag costs at least as much as the one before it.
pub fn build_baggage<R: Rng>(rng: &mut R) -> BaggagePolicy {
    BaggagePolicy {
        checked: build_allowance(rng, CHECKED_BAG_MAX, FIRST_CHECKED_BAG_DOLLARS),
        carry_on: build_allowance(rng, CARRY_ON_MAX, FIRST_CARRY_ON_DOLLARS),
    }
}

fn build_allowance<R: Rng>(
    rng: &mut R,
    max_range: std::ops::RangeInclusive<u32>,
    first_price: std::ops::RangeInclusive<u32>,
) -> BaggageAllowance {
    let max = rng.gen_range(max_range);
    let mut prices = Vec::with_capacity(max as usize);
    let mut price = 0;
    for _ in 0..max {
        price = next_rung(rng, price, first_price.clone(), 3, 2);
        prices.push(price);
    }
    BaggageAllowance { max, prices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_extras_are_a_subset_of_the_configured_list() {
        let configured = names(&["wifi", "extra legroom", "priority boarding", "lounge access"]);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let extras = build_extras(&mut rng, &configured);
            for name in extras.keys() {
                assert!(configured.contains(name));
            }
        }
    }

    #[test]
    fn test_offered_extras_escalate_in_configured_order() {
        let configured = names(&["wifi", "extra legroom", "priority boarding", "lounge access"]);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let extras = build_extras(&mut rng, &configured);

            let mut dollars = 0;
            for name in &configured {
                if let Some(extra) = extras.get(name) {
                    assert!(extra.price_dollars >= dollars);
                    dollars = extra.price_dollars;
                }
            }
        }
    }

    #[test]
    fn test_roughly_three_quarters_of_extras_are_offered() {
        let configured = names(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let mut rng = StdRng::seed_from_u64(42);

        let mut offered = 0;
        for _ in 0..200 {
            offered += build_extras(&mut rng, &configured).len();
        }
        // 2000 draws at 75%; allow a generous band around the expectation.
        assert!((1300..=1700).contains(&offered));
    }

    #[test]
    fn test_baggage_price_list_matches_max_and_escalates() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let baggage = build_baggage(&mut rng);

            for allowance in [&baggage.checked, &baggage.carry_on] {
                assert_eq!(allowance.prices.len() as u32, allowance.max);
                for pair in allowance.prices.windows(2) {
                    assert!(pair[1] >= pair[0]);
                }
            }
            assert!(CHECKED_BAG_MAX.contains(&baggage.checked.max));
            assert!(CARRY_ON_MAX.contains(&baggage.carry_on.max));
        }
    }
}
