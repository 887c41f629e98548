use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Byte width of a flight identifier.
pub const FLIGHT_ID_BYTES: usize = 12;

/// Hex width of the rendered identifier.
pub const FLIGHT_ID_HEX_CHARS: usize = FLIGHT_ID_BYTES * 2;

const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Sortable 12-byte flight identifier: a 4-byte big-endian seconds
/// timestamp, a 5-byte per-process salt and a 3-byte rolling counter.
///
/// The byte order is the sort order, so identifier-range queries stand in
/// for time-range queries against the store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlightId([u8; FLIGHT_ID_BYTES]);

impl FlightId {
    pub fn from_bytes(bytes: [u8; FLIGHT_ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// Boundary identifier for an epoch: the timestamp field alone, salt and
    /// counter zeroed. Sorts at or below every identifier minted within the
    /// same second, which makes it the cutoff for range deletes.
    pub fn boundary(epoch_ms: i64) -> Self {
        let mut bytes = [0u8; FLIGHT_ID_BYTES];
        bytes[..4].copy_from_slice(&epoch_seconds(epoch_ms).to_be_bytes());
        Self(bytes)
    }

    /// Embedded timestamp, restored to millisecond units (second precision).
    pub fn timestamp_ms(&self) -> i64 {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        i64::from(secs) * 1000
    }

    pub fn as_bytes(&self) -> &[u8; FLIGHT_ID_BYTES] {
        &self.0
    }
}

fn epoch_seconds(epoch_ms: i64) -> u32 {
    epoch_ms.div_euclid(1000).clamp(0, i64::from(u32::MAX)) as u32
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlightId({self})")
    }
}

impl FromStr for FlightId {
    type Err = FlightIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != FLIGHT_ID_HEX_CHARS {
            return Err(FlightIdError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; FLIGHT_ID_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| FlightIdError::InvalidHex(pair.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for FlightId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FlightId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlightIdError {
    #[error("flight identifier must be {FLIGHT_ID_HEX_CHARS} hex characters, got {0}")]
    InvalidLength(usize),

    #[error("flight identifier contains non-hex characters: {0}")]
    InvalidHex(String),
}

/// Mints flight identifiers for one process.
///
/// The salt is fixed at construction and the counter starts at a random
/// point, so generators in different processes stay apart even when minting
/// within the same second. Calls with non-decreasing epochs produce
/// non-decreasing identifiers; equal-second calls are strictly increasing
/// through the counter. The counter wraps after 2^24 calls, which no single
/// run approaches.
#[derive(Debug)]
pub struct FlightIdGenerator {
    salt: [u8; 5],
    counter: u32,
}

impl FlightIdGenerator {
    pub fn new() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    pub fn from_rng<R: Rng>(rng: &mut R) -> Self {
        let mut salt = [0u8; 5];
        rng.fill(&mut salt[..]);
        Self {
            salt,
            counter: rng.gen::<u32>() & COUNTER_MASK,
        }
    }

    pub fn next(&mut self, epoch_ms: i64) -> FlightId {
        self.counter = (self.counter + 1) & COUNTER_MASK;
        let mut bytes = [0u8; FLIGHT_ID_BYTES];
        bytes[..4].copy_from_slice(&epoch_seconds(epoch_ms).to_be_bytes());
        bytes[4..9].copy_from_slice(&self.salt);
        bytes[9..].copy_from_slice(&self.counter.to_be_bytes()[1..]);
        FlightId(bytes)
    }
}

impl Default for FlightIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
