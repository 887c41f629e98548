use serde::Deserialize;

/// Engine tunables, loaded once at startup and validated before any
/// generation work begins. Out-of-range values are fatal, never clamped.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Length of the generation horizon, in days ahead of now.
    pub generate_days: i64,
    /// Gate vocabulary letters per airport (at most the alphabet).
    pub gate_letters: usize,
    /// Gates per letter.
    pub gates_per_letter: usize,
    /// Per-hour probability an airport pair carries traffic, 0-100.
    pub airport_pair_used_percent: u8,
    /// Per-hour probability the hour has any flights at all, 0-100.
    pub hour_has_flights_percent: u8,
    /// Age threshold for the retention pruner, in days.
    pub retention_days: i64,
}

impl EngineConfig {
    /// Loads from `config/default` (optional file) with environment
    /// variables layered on top, then validates.
    pub fn load() -> Result<Self, ConfigError> {
        let source = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::default())
            .build()?;

        let engine: EngineConfig = source.try_deserialize()?;
        engine.validate()?;
        Ok(engine)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generate_days <= 0 {
            return Err(ConfigError::Invalid("generate_days must be positive"));
        }
        if self.gate_letters == 0 || self.gate_letters > 26 {
            return Err(ConfigError::Invalid("gate_letters must be between 1 and 26"));
        }
        if self.gates_per_letter == 0 {
            return Err(ConfigError::Invalid("gates_per_letter must be positive"));
        }
        if self.airport_pair_used_percent > 100 {
            return Err(ConfigError::Invalid(
                "airport_pair_used_percent must be between 0 and 100",
            ));
        }
        if self.hour_has_flights_percent > 100 {
            return Err(ConfigError::Invalid(
                "hour_has_flights_percent must be between 0 and 100",
            ));
        }
        if self.retention_days <= 0 {
            return Err(ConfigError::Invalid("retention_days must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}
