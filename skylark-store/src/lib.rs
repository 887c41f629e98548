pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use skylark_core::{FlightId, FlightIdError};
use skylark_shared::{Airline, Airport, Flight, ReferenceInfo};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reference record missing: {0}")]
    MissingRecord(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt identifier in store: {0}")]
    CorruptId(#[from] FlightIdError),
}

/// The narrow persistence contract the generation engine runs against.
///
/// Reference data (airports, airlines, the info record) is read-only and
/// must pre-exist; flights are write-only from the engine's perspective,
/// committed in one bulk insert and removed only by identifier range.
#[async_trait]
pub trait FlightStore: Send + Sync {
    async fn airports(&self) -> Result<Vec<Airport>, StoreError>;

    async fn airlines(&self) -> Result<Vec<Airline>, StoreError>;

    async fn reference_info(&self) -> Result<ReferenceInfo, StoreError>;

    /// The newest committed flight identifier, if any flight exists.
    async fn latest_flight_id(&self) -> Result<Option<FlightId>, StoreError>;

    /// Bulk-inserts a batch and reports how many rows were written.
    async fn insert_flights(&self, flights: &[Flight]) -> Result<u64, StoreError>;

    /// Deletes every flight whose identifier sorts below the boundary and
    /// reports how many were removed.
    async fn delete_flights_before(&self, boundary: &FlightId) -> Result<u64, StoreError>;
}
