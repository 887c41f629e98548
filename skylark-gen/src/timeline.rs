use rand::Rng;
use skylark_core::GateRegistry;
use skylark_shared::{Direction, Flight, FlightStatus, StateSnapshot};

use crate::GenError;

pub(crate) const MS_PER_MINUTE: i64 = 60 * 1000;
pub(crate) const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub(crate) const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// How far ahead of its first departure a flight becomes visible.
const SCHEDULED_LEAD_MS: i64 = 7 * MS_PER_DAY;

const CANCEL_PROBABILITY: f64 = 0.20;
const DELAY_PROBABILITY: f64 = 0.25;
const LANDING_GATE_CHANGE_PROBABILITY: f64 = 0.50;
const ARRIVAL_GATE_CHANGE_PROBABILITY: f64 = 0.15;

/// Stages of the stochastic state machine, in pass order.
///
/// Stages touching the gate pool (assignment, landing, arrival) must see
/// every flight of the hour before the next stage starts, so the driver
/// advances a whole draft collection one stage at a time rather than one
/// flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Takeoff,
    Delay,
    GateAssignment,
    Landing,
    Arrival,
    Boarding,
    Departed,
    Retire,
}

impl Stage {
    pub const PASS_ORDER: [Stage; 8] = [
        Stage::Takeoff,
        Stage::Delay,
        Stage::GateAssignment,
        Stage::Landing,
        Stage::Arrival,
        Stage::Boarding,
        Stage::Departed,
        Stage::Retire,
    ];
}

/// A flight whose timeline is still being generated.
#[derive(Debug)]
pub struct FlightDraft {
    flight: Flight,
    hour_end: i64,
    depart_from_sender: i64,
    arrive_at_receiver: i64,
    depart_from_receiver: Option<i64>,
    status: FlightStatus,
    gate: Option<String>,
    next_stage: Option<Stage>,
}

impl FlightDraft {
    /// Seeds the draft: picks the arrival inside the hour (margined so the
    /// intra-hour activations fit), derives the departures from it, and
    /// records the initial `scheduled` entry.
    pub fn schedule<R: Rng>(flight: Flight, hour_start: i64, rng: &mut R) -> Self {
        let hour_end = hour_start + MS_PER_HOUR;
        // Tail margins absorb the worst-case delay slip (15 minutes), and
        // for departures also the boarding and departure activations that
        // trail the arrival.
        let (lead_margin, tail_margin) = match flight.direction {
            Direction::Arrival => (5 * MS_PER_MINUTE, 20 * MS_PER_MINUTE),
            Direction::Departure => (5 * MS_PER_MINUTE, 35 * MS_PER_MINUTE),
        };
        let arrive_at_receiver = rng.gen_range(hour_start + lead_margin..=hour_end - tail_margin);
        let depart_from_sender =
            arrive_at_receiver - rng.gen_range(120..=300) * MS_PER_MINUTE;
        let depart_from_receiver = match flight.direction {
            Direction::Arrival => None,
            Direction::Departure => Some(arrive_at_receiver + 15 * MS_PER_MINUTE),
        };

        let mut draft = Self {
            flight,
            hour_end,
            depart_from_sender,
            arrive_at_receiver,
            depart_from_receiver,
            status: FlightStatus::Scheduled,
            gate: None,
            next_stage: Some(Stage::Takeoff),
        };
        draft.push_entry(depart_from_sender - SCHEDULED_LEAD_MS);
        draft
    }

    pub fn next_stage(&self) -> Option<Stage> {
        self.next_stage
    }

    pub fn is_terminal(&self) -> bool {
        self.next_stage.is_none()
    }

    pub fn into_flight(self) -> Flight {
        self.flight
    }

    /// Runs one stage and returns the stage the draft moves to, or `None`
    /// once the timeline is terminal.
    pub fn advance<R: Rng>(
        &mut self,
        stage: Stage,
        gates: &mut GateRegistry,
        rng: &mut R,
    ) -> Result<Option<Stage>, GenError> {
        match stage {
            Stage::Takeoff => {
                if rng.gen_bool(CANCEL_PROBABILITY) {
                    self.status = FlightStatus::Cancelled;
                    self.push_entry(self.depart_from_sender);
                    return Ok(None);
                }
                self.status = FlightStatus::OnTime;
                self.push_entry(self.depart_from_sender);
                Ok(Some(Stage::Delay))
            }
            Stage::Delay => {
                if rng.gen_bool(DELAY_PROBABILITY) {
                    let slip = rng.gen_range(5..=15) * MS_PER_MINUTE;
                    self.arrive_at_receiver += slip;
                    if let Some(depart) = self.depart_from_receiver.as_mut() {
                        *depart += slip;
                    }
                    self.status = FlightStatus::Delayed;

                    let earliest = self.depart_from_sender + 15 * MS_PER_MINUTE;
                    let latest = self.arrive_at_receiver - 2 * MS_PER_HOUR;
                    let at = if latest > earliest {
                        rng.gen_range(earliest..=latest)
                    } else {
                        earliest
                    };
                    self.push_entry(at);
                }
                Ok(Some(Stage::GateAssignment))
            }
            Stage::GateAssignment => {
                let pool = gates.pool_for(&self.flight.destination, rng);
                self.gate = Some(pool.acquire(rng)?);
                let at = self.arrive_at_receiver - rng.gen_range(15..=120) * MS_PER_MINUTE;
                self.push_entry(at);
                Ok(Some(Stage::Landing))
            }
            Stage::Landing => {
                if rng.gen_bool(LANDING_GATE_CHANGE_PROBABILITY) {
                    self.swap_gate(gates, rng)?;
                }
                self.status = FlightStatus::Landed;
                let at = self.arrive_at_receiver - rng.gen_range(5..=30) * MS_PER_MINUTE;
                self.push_entry(at);
                Ok(Some(Stage::Arrival))
            }
            Stage::Arrival => {
                if rng.gen_bool(ARRIVAL_GATE_CHANGE_PROBABILITY) {
                    self.swap_gate(gates, rng)?;
                }
                self.status = FlightStatus::Arrived;
                self.push_entry(self.arrive_at_receiver);
                match self.flight.direction {
                    Direction::Arrival => Ok(Some(Stage::Retire)),
                    Direction::Departure => Ok(Some(Stage::Boarding)),
                }
            }
            Stage::Boarding => {
                self.status = FlightStatus::Boarding;
                let at = self.arrive_at_receiver + rng.gen_range(3..=10) * MS_PER_MINUTE;
                self.push_entry(at);
                Ok(Some(Stage::Departed))
            }
            Stage::Departed => {
                let at = self.depart_from_receiver.ok_or(GenError::InconsistentDraft(
                    "departure leg reached the departed stage without departFromReceiver",
                ))?;
                self.status = FlightStatus::Departed;
                self.push_entry(at);
                Ok(Some(Stage::Retire))
            }
            Stage::Retire => {
                self.gate = None;
                self.status = FlightStatus::Past;
                let at = match self.flight.direction {
                    Direction::Arrival => self.hour_end,
                    Direction::Departure => {
                        let depart = self.depart_from_receiver.ok_or(GenError::InconsistentDraft(
                            "departure leg reached the retire stage without departFromReceiver",
                        ))?;
                        depart + rng.gen_range(120..=300) * MS_PER_MINUTE
                    }
                };
                self.push_entry(at);
                Ok(None)
            }
        }
    }

    /// Acquires a replacement gate before releasing the old one, so a gate
    /// change never hands the same token back.
    fn swap_gate<R: Rng>(&mut self, gates: &mut GateRegistry, rng: &mut R) -> Result<(), GenError> {
        let pool = gates.pool_for(&self.flight.destination, rng);
        let fresh = pool.acquire(rng)?;
        if let Some(old) = self.gate.replace(fresh) {
            pool.release(old);
        }
        Ok(())
    }

    fn push_entry(&mut self, at: i64) {
        let snapshot = StateSnapshot {
            depart_from_sender: self.depart_from_sender,
            arrive_at_receiver: self.arrive_at_receiver,
            depart_from_receiver: self.depart_from_receiver,
            status: self.status,
            gate: self.gate.clone(),
        };
        self.flight.timeline.push(at, snapshot);
    }
}

/// Advances every draft through the state machine one stage at a time,
/// sharing the gate registry across the whole collection so that flights
/// converging on one airport are sequenced against each other.
pub fn run_passes<R: Rng>(
    drafts: &mut [FlightDraft],
    gates: &mut GateRegistry,
    rng: &mut R,
) -> Result<(), GenError> {
    for stage in Stage::PASS_ORDER {
        for draft in drafts.iter_mut() {
            if draft.next_stage == Some(stage) {
                draft.next_stage = draft.advance(stage, gates, rng)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use skylark_core::FlightIdGenerator;
    use skylark_shared::{BaggageAllowance, BaggagePolicy, Timeline};
    use std::collections::{BTreeMap, HashSet};

    const HOUR_START: i64 = 1_750_000_800_000 - (1_750_000_800_000 % MS_PER_HOUR);

    /// Forces every probabilistic branch: `gen_bool` is always true and
    /// `gen_range` returns the low bound.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    fn bare_flight(ids: &mut FlightIdGenerator, direction: Direction, destination: &str) -> Flight {
        Flight {
            id: ids.next(HOUR_START),
            direction,
            airline: "Veridian Air".to_string(),
            flight_number: "VA100".to_string(),
            origin: "JFK".to_string(),
            destination: destination.to_string(),
            baggage: BaggagePolicy {
                checked: BaggageAllowance { max: 1, prices: vec![25] },
                carry_on: BaggageAllowance { max: 1, prices: vec![10] },
            },
            seats: BTreeMap::new(),
            extras: BTreeMap::new(),
            ffms: 10_000,
            booking_key: None,
            timeline: Timeline::new(),
        }
    }

    fn statuses(flight: &Flight) -> Vec<FlightStatus> {
        flight.timeline.iter().map(|(_, s)| s.status).collect()
    }

    #[test]
    fn test_cancellation_short_circuits_everything() {
        // ZeroRng turns the 20% takeoff roll into a certainty.
        let mut ids = FlightIdGenerator::new();
        let flight = bare_flight(&mut ids, Direction::Departure, "SFO");
        let mut draft = FlightDraft::schedule(flight, HOUR_START, &mut ZeroRng);
        let mut gates = GateRegistry::new(2, 6);

        run_passes(std::slice::from_mut(&mut draft), &mut gates, &mut ZeroRng).unwrap();
        assert!(draft.is_terminal());

        let flight = draft.into_flight();
        assert_eq!(
            statuses(&flight),
            vec![FlightStatus::Scheduled, FlightStatus::Cancelled]
        );
        assert!(flight.timeline.iter().all(|(_, s)| s.gate.is_none()));
    }

    #[test]
    fn test_timelines_terminate_and_keys_increase() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut ids = FlightIdGenerator::from_rng(&mut rng);
        // Wide enough that even a zero-cancellation batch cannot exhaust it.
        let mut gates = GateRegistry::new(5, 10);

        let mut drafts: Vec<FlightDraft> = (0..40)
            .map(|i| {
                let direction = if i % 2 == 0 {
                    Direction::Arrival
                } else {
                    Direction::Departure
                };
                let flight = bare_flight(&mut ids, direction, "ORD");
                FlightDraft::schedule(flight, HOUR_START, &mut rng)
            })
            .collect();

        run_passes(&mut drafts, &mut gates, &mut rng).unwrap();

        let mut saw_completed = false;
        for draft in drafts {
            assert!(draft.is_terminal());
            let flight = draft.into_flight();

            let keys: Vec<i64> = flight.timeline.iter().map(|(at, _)| *at).collect();
            for pair in keys.windows(2) {
                assert!(pair[1] > pair[0]);
            }

            let stats = statuses(&flight);
            match stats.last().copied() {
                Some(FlightStatus::Cancelled) => {
                    assert_eq!(stats, vec![FlightStatus::Scheduled, FlightStatus::Cancelled]);
                }
                Some(FlightStatus::Past) => {
                    saw_completed = true;
                    match flight.direction {
                        Direction::Arrival => {
                            // ... arrived, then past clears the gate.
                            assert_eq!(stats[stats.len() - 2], FlightStatus::Arrived);
                        }
                        Direction::Departure => {
                            let tail = &stats[stats.len() - 3..];
                            assert_eq!(
                                tail,
                                &[
                                    FlightStatus::Boarding,
                                    FlightStatus::Departed,
                                    FlightStatus::Past
                                ]
                            );
                        }
                    }
                    let (_, last) = flight.timeline.last().unwrap();
                    assert!(last.gate.is_none());
                }
                other => panic!("timeline ended in non-terminal status {other:?}"),
            }
        }
        assert!(saw_completed);
    }

    #[test]
    fn test_arrivals_retire_at_hour_end() {
        let mut rng = StdRng::seed_from_u64(33);
        let mut ids = FlightIdGenerator::from_rng(&mut rng);
        let mut gates = GateRegistry::new(4, 10);

        let mut drafts: Vec<FlightDraft> = (0..20)
            .map(|_| {
                let flight = bare_flight(&mut ids, Direction::Arrival, "DEN");
                FlightDraft::schedule(flight, HOUR_START, &mut rng)
            })
            .collect();
        run_passes(&mut drafts, &mut gates, &mut rng).unwrap();

        for draft in drafts {
            let flight = draft.into_flight();
            let (at, last) = flight.timeline.last().unwrap();
            if last.status == FlightStatus::Past {
                assert_eq!(*at, HOUR_START + MS_PER_HOUR);
            }
        }
    }

    #[test]
    fn test_gates_are_exclusive_per_pass_at_one_airport() {
        let mut rng = StdRng::seed_from_u64(55);
        let mut ids = FlightIdGenerator::from_rng(&mut rng);
        // Tight pool: 26 flights against 30 gates forces heavy reuse of the
        // vocabulary across passes.
        let mut gates = GateRegistry::new(3, 10);

        let mut drafts: Vec<FlightDraft> = (0..26)
            .map(|i| {
                let direction = if i % 2 == 0 {
                    Direction::Arrival
                } else {
                    Direction::Departure
                };
                let flight = bare_flight(&mut ids, direction, "HUB");
                FlightDraft::schedule(flight, HOUR_START, &mut rng)
            })
            .collect();
        run_passes(&mut drafts, &mut gates, &mut rng).unwrap();

        let flights: Vec<Flight> = drafts.into_iter().map(FlightDraft::into_flight).collect();

        // After each gate-touching pass every live flight holds its gate
        // simultaneously, so the gates recorded for that pass must be
        // pairwise distinct.
        let landed: Vec<&str> = gates_with_status(&flights, FlightStatus::Landed);
        let arrived: Vec<&str> = gates_with_status(&flights, FlightStatus::Arrived);
        let assigned: Vec<&str> = flights
            .iter()
            .filter_map(|f| {
                f.timeline
                    .iter()
                    .find(|(_, s)| s.gate.is_some())
                    .and_then(|(_, s)| s.gate.as_deref())
            })
            .collect();

        for group in [assigned, landed, arrived] {
            let unique: HashSet<&str> = group.iter().copied().collect();
            assert_eq!(unique.len(), group.len());
        }
    }

    fn gates_with_status(flights: &[Flight], status: FlightStatus) -> Vec<&str> {
        flights
            .iter()
            .filter_map(|f| {
                f.timeline
                    .iter()
                    .find(|(_, s)| s.status == status)
                    .and_then(|(_, s)| s.gate.as_deref())
            })
            .collect()
    }
}
