use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use skylark_core::FlightId;

/// Which side of the tracked airport the leg is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Arrival,
    Departure,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Arrival => Direction::Departure,
            Direction::Departure => Direction::Arrival,
        }
    }
}

/// Operational status carried by a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightStatus {
    #[serde(rename = "scheduled")]
    Scheduled,
    #[serde(rename = "on time")]
    OnTime,
    #[serde(rename = "delayed")]
    Delayed,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "landed")]
    Landed,
    #[serde(rename = "arrived")]
    Arrived,
    #[serde(rename = "boarding")]
    Boarding,
    #[serde(rename = "departed")]
    Departed,
    #[serde(rename = "past")]
    Past,
}

impl FlightStatus {
    /// Terminal states admit no further timeline entries.
    pub fn is_terminal(self) -> bool {
        matches!(self, FlightStatus::Cancelled | FlightStatus::Past)
    }
}

/// One time-activated operational state of a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub depart_from_sender: i64,
    pub arrive_at_receiver: i64,
    pub depart_from_receiver: Option<i64>,
    pub status: FlightStatus,
    pub gate: Option<String>,
}

/// Ordered sequence of state snapshots keyed by activation epoch
/// (milliseconds). Insertion order is chronological; keys are kept strictly
/// increasing by bumping a non-advancing key to one past the previous entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<(i64, StateSnapshot)>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot and returns the activation epoch it was stored
    /// under, which is `at` unless the key had to be bumped.
    pub fn push(&mut self, at: i64, snapshot: StateSnapshot) -> i64 {
        let at = match self.entries.last() {
            Some((last, _)) if at <= *last => last + 1,
            _ => at,
        };
        self.entries.push((at, snapshot));
        at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (i64, StateSnapshot)> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&(i64, StateSnapshot)> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&(i64, StateSnapshot)> {
        self.entries.last()
    }

    /// The externally visible state at `at`: the entry with the greatest
    /// activation epoch at or before it.
    pub fn state_at(&self, at: i64) -> Option<&StateSnapshot> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| *key <= at)
            .map(|(_, snapshot)| snapshot)
    }

    pub fn is_terminal(&self) -> bool {
        self.entries
            .last()
            .is_some_and(|(_, snapshot)| snapshot.status.is_terminal())
    }
}

impl Serialize for Timeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (at, snapshot) in &self.entries {
            map.serialize_entry(&at.to_string(), snapshot)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Timeline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimelineVisitor;

        impl<'de> Visitor<'de> for TimelineVisitor {
            type Value = Timeline;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of millisecond epoch keys to state snapshots")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Timeline, A::Error> {
                let mut entries: Vec<(i64, StateSnapshot)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, snapshot)) = map.next_entry::<String, StateSnapshot>()? {
                    let at = key.parse::<i64>().map_err(|_| {
                        de::Error::custom(format!("invalid activation epoch key: {key}"))
                    })?;
                    entries.push((at, snapshot));
                }
                entries.sort_by_key(|(at, _)| *at);
                if entries.windows(2).any(|pair| pair[0].0 == pair[1].0) {
                    return Err(de::Error::custom("duplicate activation epoch key"));
                }
                Ok(Timeline { entries })
            }
        }

        deserializer.deserialize_map(TimelineVisitor)
    }
}

/// Per-class seat block with its dollar and loyalty prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatClass {
    pub total: u32,
    pub price_dollars: u32,
    pub price_ffms: u32,
}

/// Pricing for one optional extra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPricing {
    pub price_dollars: u32,
    pub price_ffms: u32,
}

/// Allowance for one baggage kind: the item cap and the per-item price
/// ladder (one entry per allowed item, each priced at or above the last).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaggageAllowance {
    pub max: u32,
    pub prices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaggagePolicy {
    pub checked: BaggageAllowance,
    pub carry_on: BaggageAllowance,
}

/// A synthesized flight leg: static attributes fixed at creation plus the
/// precomputed state timeline. Never mutated after the generation pass that
/// produced it; removed only by the retention pruner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: FlightId,
    pub direction: Direction,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub baggage: BaggagePolicy,
    pub seats: BTreeMap<String, SeatClass>,
    pub extras: BTreeMap<String, ExtraPricing>,
    pub ffms: u32,
    pub booking_key: Option<String>,
    pub timeline: Timeline,
}
