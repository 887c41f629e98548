use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use skylark_core::FlightId;
use skylark_shared::{Airline, Airport, Flight, ReferenceInfo};

use crate::{FlightStore, StoreError};

/// In-memory store used by tests and dry runs. Cloning yields another
/// handle onto the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    airports: Vec<Airport>,
    airlines: Vec<Airline>,
    info: Option<ReferenceInfo>,
    flights: BTreeMap<FlightId, Flight>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_data(
        airports: Vec<Airport>,
        airlines: Vec<Airline>,
        info: ReferenceInfo,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                airports,
                airlines,
                info: Some(info),
                flights: BTreeMap::new(),
            })),
        }
    }

    pub fn flight_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").flights.len()
    }

    pub fn flight_ids(&self) -> Vec<FlightId> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .flights
            .keys()
            .copied()
            .collect()
    }

    pub fn flights(&self) -> Vec<Flight> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .flights
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &FlightId) -> Option<Flight> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .flights
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl FlightStore for MemoryStore {
    async fn airports(&self) -> Result<Vec<Airport>, StoreError> {
        Ok(self.inner.read().expect("store lock poisoned").airports.clone())
    }

    async fn airlines(&self) -> Result<Vec<Airline>, StoreError> {
        Ok(self.inner.read().expect("store lock poisoned").airlines.clone())
    }

    async fn reference_info(&self) -> Result<ReferenceInfo, StoreError> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .info
            .clone()
            .ok_or(StoreError::MissingRecord("reference info"))
    }

    async fn latest_flight_id(&self) -> Result<Option<FlightId>, StoreError> {
        Ok(self
            .inner
            .read()
            .expect("store lock poisoned")
            .flights
            .keys()
            .next_back()
            .copied())
    }

    async fn insert_flights(&self, flights: &[Flight]) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let mut inserted = 0;
        for flight in flights {
            if inner.flights.insert(flight.id, flight.clone()).is_none() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn delete_flights_before(&self, boundary: &FlightId) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        // split_off keeps everything at or above the boundary; what stays
        // behind is exactly the expired range.
        let kept = inner.flights.split_off(boundary);
        let removed = inner.flights.len() as u64;
        inner.flights = kept;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylark_core::FlightIdGenerator;
    use skylark_shared::{BaggageAllowance, BaggagePolicy, Direction, Timeline};
    use std::collections::BTreeMap as Map;

    fn flight(id: FlightId) -> Flight {
        Flight {
            id,
            direction: Direction::Arrival,
            airline: "Polar Jet".to_string(),
            flight_number: "PJ101".to_string(),
            origin: "SEA".to_string(),
            destination: "ANC".to_string(),
            baggage: BaggagePolicy {
                checked: BaggageAllowance { max: 1, prices: vec![25] },
                carry_on: BaggageAllowance { max: 1, prices: vec![10] },
            },
            seats: Map::new(),
            extras: Map::new(),
            ffms: 8_000,
            booking_key: None,
            timeline: Timeline::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_reports_new_rows_only() {
        let store = MemoryStore::new();
        let mut ids = FlightIdGenerator::new();
        let batch = vec![flight(ids.next(1_000_000)), flight(ids.next(2_000_000))];

        assert_eq!(store.insert_flights(&batch).await.unwrap(), 2);
        // Re-inserting the same identifiers writes nothing new.
        assert_eq!(store.insert_flights(&batch).await.unwrap(), 0);
        assert_eq!(store.flight_count(), 2);
    }

    #[tokio::test]
    async fn test_latest_id_is_the_greatest() {
        let store = MemoryStore::new();
        let mut ids = FlightIdGenerator::new();

        assert!(store.latest_flight_id().await.unwrap().is_none());

        let early = ids.next(1_000_000);
        let late = ids.next(9_000_000);
        store
            .insert_flights(&[flight(late), flight(early)])
            .await
            .unwrap();
        assert_eq!(store.latest_flight_id().await.unwrap(), Some(late));
    }

    #[tokio::test]
    async fn test_delete_before_boundary_is_exact_and_idempotent() {
        let store = MemoryStore::new();
        let mut ids = FlightIdGenerator::new();

        let old = flight(ids.next(1_000_000));
        let newer = flight(ids.next(5_000_000));
        store.insert_flights(&[old.clone(), newer.clone()]).await.unwrap();

        let boundary = FlightId::boundary(5_000_000);
        assert_eq!(store.delete_flights_before(&boundary).await.unwrap(), 1);
        assert!(store.get(&old.id).is_none());
        assert!(store.get(&newer.id).is_some());

        // Nothing left below the boundary.
        assert_eq!(store.delete_flights_before(&boundary).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_reference_info_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.reference_info().await,
            Err(StoreError::MissingRecord(_))
        ));
    }
}
