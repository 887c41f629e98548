pub mod models;

pub use models::flight::{
    BaggageAllowance, BaggagePolicy, Direction, ExtraPricing, Flight, FlightStatus, SeatClass,
    StateSnapshot, Timeline,
};
pub use models::reference::{Airline, Airport, ReferenceInfo};
