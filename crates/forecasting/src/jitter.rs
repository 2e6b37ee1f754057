//! Source of the small random offset added to base confidence.
//!
//! Production runs vary within `[0, 5)` from one call to the next; tests pin
//! the offset with [`FixedJitter`] or a seeded [`RandomJitter`].

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper (exclusive) bound of the confidence jitter.
pub const MAX_JITTER: f64 = 5.0;

pub trait JitterSource: Send + Sync {
    /// A value in `[0, MAX_JITTER)`.
    fn next_jitter(&self) -> f64;
}

pub struct RandomJitter {
    rng: Mutex<StdRng>,
}

impl RandomJitter {
    pub fn from_entropy() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl core::fmt::Debug for RandomJitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RandomJitter").finish_non_exhaustive()
    }
}

impl JitterSource for RandomJitter {
    fn next_jitter(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..MAX_JITTER),
            // Poisoned: the generator state is still valid.
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..MAX_JITTER),
        }
    }
}

/// Always returns the same offset, clamped into range.
#[derive(Debug, Copy, Clone)]
pub struct FixedJitter(f64);

impl FixedJitter {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, MAX_JITTER - f64::EPSILON * 8.0))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }
}

impl JitterSource for FixedJitter {
    fn next_jitter(&self) -> f64 {
        self.0
    }
}
