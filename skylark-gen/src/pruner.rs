use chrono::{DateTime, Utc};
use skylark_core::FlightId;
use skylark_store::{FlightStore, StoreError};
use tracing::info;

use crate::timeline::MS_PER_DAY;

/// Deletes every flight older than the retention horizon, using only
/// identifier comparison. Idempotent; deleting nothing is a normal outcome.
pub async fn prune<S: FlightStore>(store: &S, retention_days: i64) -> Result<u64, StoreError> {
    prune_at(store, retention_days, Utc::now()).await
}

pub async fn prune_at<S: FlightStore>(
    store: &S,
    retention_days: i64,
    now: DateTime<Utc>,
) -> Result<u64, StoreError> {
    let cutoff_ms = now.timestamp_millis() - retention_days * MS_PER_DAY;
    let boundary = FlightId::boundary(cutoff_ms);
    let deleted = store.delete_flights_before(&boundary).await?;
    info!(deleted, boundary = %boundary, "retention prune complete");
    Ok(deleted)
}
