pub mod config;
pub mod driver;
pub mod pruner;
pub mod timeline;

use skylark_core::GateError;
use skylark_store::StoreError;

pub use crate::config::{ConfigError, EngineConfig};
pub use driver::{FlightGenerator, GenerationReport};

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("reference data missing: {0}")]
    MissingReferenceData(&'static str),

    #[error(transparent)]
    Gates(#[from] GateError),

    #[error("flight number pool exhausted for airline {0}")]
    FlightNumbersExhausted(String),

    #[error("bulk insert reported {inserted} rows for {generated} generated flights")]
    InsertCountMismatch { generated: u64, inserted: u64 },

    #[error("inconsistent flight draft: {0}")]
    InconsistentDraft(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}
