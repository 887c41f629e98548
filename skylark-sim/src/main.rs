use anyhow::Context;
use skylark_gen::{pruner, EngineConfig, FlightGenerator};
use skylark_shared::{Airline, Airport, ReferenceInfo};
use skylark_store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skylark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::load()?;
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let store = PgStore::connect(&database_url).await?;
    store.init_schema().await?;

    if std::env::args().any(|arg| arg == "--seed-demo") {
        seed_demo(&store).await?;
    }

    let deleted = pruner::prune(&store, config.retention_days).await?;
    tracing::info!(deleted, "retention prune finished");

    let mut generator = FlightGenerator::new(store, config);
    let report = generator.generate().await?;
    tracing::info!(
        hours = report.hours_considered,
        skipped = report.hours_skipped,
        flights = report.flights_inserted,
        "generation run finished"
    );
    Ok(())
}

/// Loads a small demo reference dataset so a fresh database can generate
/// immediately.
async fn seed_demo(store: &PgStore) -> anyhow::Result<()> {
    let airports = [
        airport("John F. Kennedy International", "JFK", "New York", "NY", Some("chapter-nyc")),
        airport("San Francisco International", "SFO", "San Francisco", "CA", Some("chapter-bay")),
        airport("O'Hare International", "ORD", "Chicago", "IL", None),
        airport("Denver International", "DEN", "Denver", "CO", None),
    ];
    for entry in &airports {
        store.put_airport(entry).await?;
    }

    let airlines = [
        Airline { name: "Veridian Air".to_string(), prefix: "VA".to_string() },
        Airline { name: "Polar Jet".to_string(), prefix: "PJ".to_string() },
        Airline { name: "Meridian Express".to_string(), prefix: "ME".to_string() },
    ];
    for entry in &airlines {
        store.put_airline(entry).await?;
    }

    store
        .put_reference_info(&ReferenceInfo {
            seat_classes: vec![
                "economy".to_string(),
                "premium economy".to_string(),
                "business".to_string(),
                "first".to_string(),
            ],
            extras: vec![
                "wifi".to_string(),
                "extra legroom".to_string(),
                "priority boarding".to_string(),
                "lounge access".to_string(),
                "in-flight meal".to_string(),
            ],
        })
        .await?;

    tracing::info!("demo reference data seeded");
    Ok(())
}

fn airport(name: &str, code: &str, city: &str, state: &str, chapter_key: Option<&str>) -> Airport {
    Airport {
        name: name.to_string(),
        code: code.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        country: "USA".to_string(),
        chapter_key: chapter_key.map(str::to_string),
    }
}
