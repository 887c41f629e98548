use std::time::Duration;

use async_trait::async_trait;
use skylark_core::FlightId;
use skylark_shared::{Airline, Airport, Flight, ReferenceInfo};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::{FlightStore, StoreError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS airports (code TEXT PRIMARY KEY, doc JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS airlines (name TEXT PRIMARY KEY, doc JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS reference_info (id SMALLINT PRIMARY KEY, doc JSONB NOT NULL)",
    "CREATE TABLE IF NOT EXISTS flights (id TEXT PRIMARY KEY, doc JSONB NOT NULL)",
];

/// Postgres adapter. Every entity is stored as a JSONB document keyed by
/// its natural identifier; the flight primary key is the 24-hex identifier,
/// so identifier range scans ride the primary index.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("store schema ready");
        Ok(())
    }

    pub async fn put_airport(&self, airport: &Airport) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO airports (code, doc) VALUES ($1, $2) \
             ON CONFLICT (code) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(&airport.code)
        .bind(serde_json::to_value(airport)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn put_airline(&self, airline: &Airline) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO airlines (name, doc) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(&airline.name)
        .bind(serde_json::to_value(airline)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn put_reference_info(&self, info: &ReferenceInfo) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO reference_info (id, doc) VALUES (1, $1) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(serde_json::to_value(info)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FlightStore for PgStore {
    async fn airports(&self) -> Result<Vec<Airport>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM airports ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let doc: serde_json::Value = row.try_get("doc")?;
                Ok(serde_json::from_value(doc)?)
            })
            .collect()
    }

    async fn airlines(&self) -> Result<Vec<Airline>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM airlines ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let doc: serde_json::Value = row.try_get("doc")?;
                Ok(serde_json::from_value(doc)?)
            })
            .collect()
    }

    async fn reference_info(&self) -> Result<ReferenceInfo, StoreError> {
        let row = sqlx::query("SELECT doc FROM reference_info WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::MissingRecord("reference info"))?;
        let doc: serde_json::Value = row.try_get("doc")?;
        Ok(serde_json::from_value(doc)?)
    }

    async fn latest_flight_id(&self) -> Result<Option<FlightId>, StoreError> {
        let row = sqlx::query("SELECT id FROM flights ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let id: String = row.try_get("id")?;
                Ok(Some(id.parse()?))
            }
            None => Ok(None),
        }
    }

    async fn insert_flights(&self, flights: &[Flight]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for flight in flights {
            let result = sqlx::query("INSERT INTO flights (id, doc) VALUES ($1, $2)")
                .bind(flight.id.to_string())
                .bind(serde_json::to_value(flight)?)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn delete_flights_before(&self, boundary: &FlightId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM flights WHERE id < $1")
            .bind(boundary.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
