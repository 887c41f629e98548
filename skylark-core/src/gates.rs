use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

/// Finite pool of gate tokens for one airport.
///
/// A token leaves the pool on acquire and only returns through an explicit
/// release, so the set of currently held gates can never contain duplicates.
#[derive(Debug)]
pub struct GatePool {
    available: Vec<String>,
}

impl GatePool {
    /// Builds the `letters x per_letter` vocabulary (`a1`, `a2`, ... `b1`,
    /// ...) and shuffles it. Letters beyond `z` are not a valid
    /// configuration and are truncated by the alphabet itself.
    pub fn new<R: Rng>(letters: usize, per_letter: usize, rng: &mut R) -> Self {
        let mut available = Vec::with_capacity(letters * per_letter);
        for letter in ('a'..='z').take(letters) {
            for number in 1..=per_letter {
                available.push(format!("{letter}{number}"));
            }
        }
        available.shuffle(rng);
        Self { available }
    }

    /// Removes and returns a random token. An empty pool is a configuration
    /// error (too few gates for the traffic volume) and is not retried.
    pub fn acquire<R: Rng>(&mut self, rng: &mut R) -> Result<String, GateError> {
        if self.available.is_empty() {
            return Err(GateError::Exhausted);
        }
        let index = rng.gen_range(0..self.available.len());
        Ok(self.available.swap_remove(index))
    }

    /// Returns a token to the pool for reuse by a later acquire.
    pub fn release(&mut self, gate: String) {
        self.available.push(gate);
    }

    pub fn available(&self) -> usize {
        self.available.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("gate pool exhausted: every gate at the airport is already assigned")]
    Exhausted,
}

/// Lazily built gate pools, one per airport, scoped to a single generation
/// pass. Each pool is freshly shuffled when first touched, so assignments
/// are not stable across passes.
#[derive(Debug)]
pub struct GateRegistry {
    letters: usize,
    per_letter: usize,
    pools: HashMap<String, GatePool>,
}

impl GateRegistry {
    pub fn new(letters: usize, per_letter: usize) -> Self {
        Self {
            letters,
            per_letter,
            pools: HashMap::new(),
        }
    }

    pub fn pool_for<R: Rng>(&mut self, airport_code: &str, rng: &mut R) -> &mut GatePool {
        let (letters, per_letter) = (self.letters, self.per_letter);
        self.pools
            .entry(airport_code.to_string())
            .or_insert_with(|| GatePool::new(letters, per_letter, rng))
    }
}
