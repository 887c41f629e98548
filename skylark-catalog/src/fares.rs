use std::collections::BTreeMap;

use rand::Rng;
use skylark_shared::SeatClass;

/// Every fabricated leg flies the same airframe.
pub const PLANE_CAPACITY: u32 = 250;

/// Dollar fare range for the first (cheapest) seat class.
const BASE_FARE_DOLLARS: std::ops::RangeInclusive<u32> = 59..=249;

/// Loyalty fare range for the first seat class.
const BASE_FARE_FFMS: std::ops::RangeInclusive<u32> = 2_000..=8_000;

/// Partitions the plane across the ordered class list and attaches the
/// escalating price ladder.
///
/// Seat totals come from random weights scaled to capacity and floored,
/// sorted descending so the first class is the biggest block; the rounding
/// remainder lands on that first class, making the totals sum to capacity
/// exactly. Each class after the first draws its prices from
/// `[previous, previous * 2]`.
pub fn build_seats<R: Rng>(rng: &mut R, classes: &[String]) -> BTreeMap<String, SeatClass> {
    if classes.is_empty() {
        return BTreeMap::new();
    }

    let weights: Vec<f64> = classes.iter().map(|_| rng.gen_range(0.05..1.0)).collect();
    let weight_sum: f64 = weights.iter().sum();
    let mut totals: Vec<u32> = weights
        .iter()
        .map(|w| (w / weight_sum * f64::from(PLANE_CAPACITY)) as u32)
        .collect();
    totals.sort_unstable_by(|a, b| b.cmp(a));
    let assigned: u32 = totals.iter().sum();
    totals[0] += PLANE_CAPACITY - assigned;

    let mut seats = BTreeMap::new();
    let mut dollars = 0;
    let mut ffms = 0;
    for (class, total) in classes.iter().zip(totals) {
        dollars = next_rung(rng, dollars, BASE_FARE_DOLLARS, 2, 1);
        ffms = next_rung(rng, ffms, BASE_FARE_FFMS, 2, 1);
        seats.insert(
            class.clone(),
            SeatClass {
                total,
                price_dollars: dollars,
                price_ffms: ffms,
            },
        );
    }
    seats
}

/// One step up a price ladder: the base range for the first rung, then a
/// bounded `numerator/denominator` multiple of the previous rung.
pub(crate) fn next_rung<R: Rng>(
    rng: &mut R,
    previous: u32,
    base: std::ops::RangeInclusive<u32>,
    numerator: u32,
    denominator: u32,
) -> u32 {
    if previous == 0 {
        rng.gen_range(base)
    } else {
        rng.gen_range(previous..=previous * numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_seat_totals_always_sum_to_capacity() {
        let lists = [
            classes(&["economy"]),
            classes(&["economy", "business"]),
            classes(&["economy", "premium economy", "business", "first"]),
        ];

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for list in &lists {
                let seats = build_seats(&mut rng, list);
                let total: u32 = seats.values().map(|s| s.total).sum();
                assert_eq!(total, PLANE_CAPACITY);
            }
        }
    }

    #[test]
    fn test_first_class_holds_the_largest_block() {
        let list = classes(&["economy", "business", "first"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let seats = build_seats(&mut rng, &list);
            let economy = seats["economy"].total;
            assert!(economy >= seats["business"].total);
            assert!(economy >= seats["first"].total);
        }
    }

    #[test]
    fn test_prices_escalate_in_class_order() {
        let list = classes(&["economy", "premium economy", "business", "first"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let seats = build_seats(&mut rng, &list);

            let mut dollars = 0;
            let mut ffms = 0;
            for class in &list {
                let seat = &seats[class];
                assert!(seat.price_dollars >= dollars);
                assert!(seat.price_ffms >= ffms);
                dollars = seat.price_dollars;
                ffms = seat.price_ffms;
            }
            // The ladder is bounded too: no class more than doubles its
            // predecessor.
            assert!(seats["first"].price_dollars <= *BASE_FARE_DOLLARS.end() * 8);
        }
    }

    #[test]
    fn test_empty_class_list_yields_no_seats() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(build_seats(&mut rng, &[]).is_empty());
    }
}
