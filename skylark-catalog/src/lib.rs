pub mod ancillaries;
pub mod fares;

use rand::Rng;
use skylark_shared::{BaggagePolicy, ExtraPricing, ReferenceInfo, SeatClass};
use std::collections::BTreeMap;

pub use fares::PLANE_CAPACITY;

/// Loyalty-currency cost range for booking a leg itself.
const LEG_FFMS_RANGE: std::ops::RangeInclusive<u32> = 5_000..=25_000;

/// The static, non-temporal attributes of one fabricated leg.
#[derive(Debug, Clone)]
pub struct LegAttributes {
    pub seats: BTreeMap<String, SeatClass>,
    pub extras: BTreeMap<String, ExtraPricing>,
    pub baggage: BaggagePolicy,
    pub ffms: u32,
}

/// Fabricates the full static attribute set for one leg from the reference
/// record's ordered class and extra lists.
pub fn fabricate<R: Rng>(rng: &mut R, info: &ReferenceInfo) -> LegAttributes {
    LegAttributes {
        seats: fares::build_seats(rng, &info.seat_classes),
        extras: ancillaries::build_extras(rng, &info.extras),
        baggage: ancillaries::build_baggage(rng),
        ffms: rng.gen_range(LEG_FFMS_RANGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fabricate_covers_every_attribute_group() {
        let mut rng = StdRng::seed_from_u64(9);
        let info = ReferenceInfo {
            seat_classes: vec!["economy".to_string(), "business".to_string()],
            extras: vec!["wifi".to_string(), "lounge access".to_string()],
        };

        let attrs = fabricate(&mut rng, &info);
        assert_eq!(attrs.seats.len(), 2);
        assert!(attrs.extras.len() <= 2);
        assert!(LEG_FFMS_RANGE.contains(&attrs.ffms));
        assert_eq!(attrs.baggage.checked.prices.len() as u32, attrs.baggage.checked.max);
    }
}
