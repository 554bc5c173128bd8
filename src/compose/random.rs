use parking_lot::Mutex;
use rand::{Rng, SeedableRng, TryRngCore, rngs::OsRng, rngs::StdRng};

use crate::foundation::error::{RigError, RigResult};

/// Supplier of independent uniform draws in `[0, 1)`.
pub trait RandomnessSource: Send + Sync {
    /// Produce `n` draws, or fail when the underlying entropy source does.
    fn gen_randoms(&self, n: usize) -> RigResult<Vec<f64>>;
}

/// Map 53 random bits onto `[0, 1)`.
fn unit_f64(bits: u64) -> f64 {
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Operating-system entropy. Failures surface as resource errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomnessSource for OsRandom {
    fn gen_randoms(&self, n: usize) -> RigResult<Vec<f64>> {
        let mut rng = OsRng;
        (0..n)
            .map(|_| {
                rng.try_next_u64()
                    .map(unit_f64)
                    .map_err(|e| RigError::resource(format!("os entropy source failed: {e}")))
            })
            .collect()
    }
}

/// Seeded PRNG for reproducible batches.
///
/// Draws are handed out in call order, so a batch is only reproducible when composition requests
/// reach the source in a fixed order.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomnessSource for SeededRandom {
    fn gen_randoms(&self, n: usize) -> RigResult<Vec<f64>> {
        let mut rng = self.rng.lock();
        Ok((0..n).map(|_| rng.random::<f64>()).collect())
    }
}

/// Scripted draws, consumed front to back. Running dry is an error.
#[derive(Debug, Default)]
pub struct FixedRandoms {
    draws: Mutex<std::collections::VecDeque<f64>>,
}

impl FixedRandoms {
    /// Source replaying `draws`.
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
        }
    }

    /// Draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.lock().len()
    }
}

impl RandomnessSource for FixedRandoms {
    fn gen_randoms(&self, n: usize) -> RigResult<Vec<f64>> {
        let mut draws = self.draws.lock();
        if draws.len() < n {
            return Err(RigError::resource(format!(
                "scripted randomness exhausted: wanted {n}, have {}",
                draws.len()
            )));
        }
        Ok(draws.drain(..n).collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/random.rs"]
mod tests;
