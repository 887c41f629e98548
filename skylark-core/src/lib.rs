pub mod flight_id;
pub mod gates;

pub use flight_id::{FlightId, FlightIdError, FlightIdGenerator};
pub use gates::{GateError, GatePool, GateRegistry};
