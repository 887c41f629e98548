use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use skylark_core::{FlightIdGenerator, GateRegistry};
use skylark_shared::{Airline, Airport, Direction, Flight, ReferenceInfo, Timeline};
use skylark_store::FlightStore;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::timeline::{run_passes, FlightDraft, MS_PER_DAY, MS_PER_HOUR};
use crate::GenError;

/// Flight numbers drawn per airline per hour; numbers repeat across hours
/// the way real schedules do.
const FLIGHT_NUMBER_RANGE: std::ops::RangeInclusive<u16> = 100..=999;

/// Outcome of one generation run. Zero flights is a normal result, not an
/// error: it means the horizon was already covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub hours_considered: i64,
    pub hours_skipped: i64,
    pub flights_inserted: u64,
}

impl GenerationReport {
    fn empty(hours_considered: i64, hours_skipped: i64) -> Self {
        Self {
            hours_considered,
            hours_skipped,
            flights_inserted: 0,
        }
    }
}

/// Orchestrates a generation run: finds the hour windows still missing
/// data, fabricates one batch of flights per window, and commits the whole
/// run in a single bulk write.
pub struct FlightGenerator<S> {
    store: S,
    config: EngineConfig,
    ids: FlightIdGenerator,
    rng: StdRng,
}

impl<S: FlightStore> FlightGenerator<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            ids: FlightIdGenerator::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic constructor for tests.
    pub fn with_rng(store: S, config: EngineConfig, ids: FlightIdGenerator, rng: StdRng) -> Self {
        Self {
            store,
            config,
            ids,
            rng,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn generate(&mut self) -> Result<GenerationReport, GenError> {
        self.generate_at(Utc::now()).await
    }

    /// Runs one generation pass against a fixed "now".
    pub async fn generate_at(&mut self, now: DateTime<Utc>) -> Result<GenerationReport, GenError> {
        let airports = self.store.airports().await?;
        if airports.len() < 2 {
            return Err(GenError::MissingReferenceData(
                "at least two airports are required",
            ));
        }
        let airlines = self.store.airlines().await?;
        if airlines.len() < 2 {
            return Err(GenError::MissingReferenceData(
                "at least two airlines are required",
            ));
        }
        let info = self.store.reference_info().await?;

        let now_ms = now.timestamp_millis();
        let last_hour = match self.store.latest_flight_id().await? {
            Some(id) => floor_to_hour(id.timestamp_ms()),
            None => floor_to_hour(now_ms),
        };
        let horizon = floor_to_hour(now_ms + self.config.generate_days * MS_PER_DAY);
        let hours = (horizon - last_hour) / MS_PER_HOUR;
        if hours <= 0 {
            info!("generation horizon already covered, nothing to do");
            return Ok(GenerationReport::empty(0, 0));
        }

        let hour_traffic = f64::from(self.config.hour_has_flights_percent) / 100.0;
        let mut flights = Vec::new();
        let mut skipped = 0;
        for offset in 1..=hours {
            let hour_start = last_hour + offset * MS_PER_HOUR;
            if !self.rng.gen_bool(hour_traffic) {
                skipped += 1;
                continue;
            }
            let batch = self.generate_hour(hour_start, &airports, &airlines, &info)?;
            debug!(hour_start, flights = batch.len(), "hour generated");
            flights.extend(batch);
        }

        if flights.is_empty() {
            info!(hours, skipped, "generation run produced no flights");
            return Ok(GenerationReport::empty(hours, skipped));
        }

        let generated = flights.len() as u64;
        let inserted = self.store.insert_flights(&flights).await?;
        if inserted != generated {
            return Err(GenError::InsertCountMismatch {
                generated,
                inserted,
            });
        }
        info!(hours, skipped, inserted, "generation run committed");
        Ok(GenerationReport {
            hours_considered: hours,
            hours_skipped: skipped,
            flights_inserted: inserted,
        })
    }

    /// Prunes flights older than the retention horizon. Runs ahead of
    /// generation so expired records never survive a full cycle.
    pub async fn prune(&self) -> Result<u64, GenError> {
        Ok(crate::pruner::prune(&self.store, self.config.retention_days).await?)
    }

    /// Fabricates one hour window: picks the active airlines, walks every
    /// ordered airport pair, and runs the timeline passes over the whole
    /// batch with gate pools scoped to this hour.
    fn generate_hour(
        &mut self,
        hour_start: i64,
        airports: &[Airport],
        airlines: &[Airline],
        info: &ReferenceInfo,
    ) -> Result<Vec<Flight>, GenError> {
        let mut shuffled: Vec<&Airline> = airlines.iter().collect();
        shuffled.shuffle(&mut self.rng);
        let active_count = self.rng.gen_range(2..=shuffled.len());
        let active = &shuffled[..active_count];

        let mut numbers: HashMap<&str, Vec<u16>> = active
            .iter()
            .map(|airline| {
                let mut pool: Vec<u16> = FLIGHT_NUMBER_RANGE.collect();
                pool.shuffle(&mut self.rng);
                (airline.name.as_str(), pool)
            })
            .collect();

        let pair_traffic = f64::from(self.config.airport_pair_used_percent) / 100.0;
        let mut direction = Direction::Arrival;
        let mut drafts = Vec::new();
        for origin in airports {
            for destination in airports {
                if origin.code == destination.code {
                    continue;
                }
                if !self.rng.gen_bool(pair_traffic) {
                    continue;
                }
                for airline in active {
                    let pool = numbers.get_mut(airline.name.as_str()).ok_or(
                        GenError::InconsistentDraft("active airline lost its number pool"),
                    )?;
                    let number = pool
                        .pop()
                        .ok_or_else(|| GenError::FlightNumbersExhausted(airline.name.clone()))?;
                    direction = direction.opposite();

                    let booking_key = match direction {
                        Direction::Departure => origin.chapter_key.clone(),
                        Direction::Arrival => None,
                    };
                    let attrs = skylark_catalog::fabricate(&mut self.rng, info);
                    let flight = Flight {
                        id: self.ids.next(hour_start),
                        direction,
                        airline: airline.name.clone(),
                        flight_number: format!("{}{}", airline.prefix, number),
                        origin: origin.code.clone(),
                        destination: destination.code.clone(),
                        baggage: attrs.baggage,
                        seats: attrs.seats,
                        extras: attrs.extras,
                        ffms: attrs.ffms,
                        booking_key,
                        timeline: Timeline::new(),
                    };
                    drafts.push(FlightDraft::schedule(flight, hour_start, &mut self.rng));
                }
            }
        }

        let mut gates = GateRegistry::new(self.config.gate_letters, self.config.gates_per_letter);
        run_passes(&mut drafts, &mut gates, &mut self.rng)?;
        Ok(drafts.into_iter().map(FlightDraft::into_flight).collect())
    }
}

pub(crate) fn floor_to_hour(epoch_ms: i64) -> i64 {
    epoch_ms - epoch_ms.rem_euclid(MS_PER_HOUR)
}
