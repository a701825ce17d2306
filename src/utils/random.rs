//! Random sources for the stochastic parts of the simulation.
//!
//! AV-block beat dropping, PVC timing, atrial fibrillation jitter, ischemic
//! T-wave inversion and SpO2 noise all draw from a [`RandomSource`]. The engine
//! is generic over the source so tests and replays can substitute a seeded or
//! fully scripted sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{CardioError, Result};

/// A source of uniformly distributed numbers in `[0, 1)`.
///
/// Every derived draw is bounded by construction, so no implementation can
/// produce a non-finite interval or sample.
pub trait RandomSource {
    /// Returns the next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Returns a value in `[min, max)`, or `min` when the range is empty.
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        min + (max - min) * self.next_unit()
    }
}

/// Seeded ChaCha20 generator.
///
/// # Example
///
/// ```rust
/// use cardiosim::utils::{Random, RandomSource};
///
/// let mut a = Random::new(42);
/// let mut b = Random::new(42);
/// assert_eq!(a.next_unit(), b.next_unit());
///
/// let jitter = a.uniform(-0.25, 0.25);
/// assert!((-0.25..0.25).contains(&jitter));
/// ```
pub struct Random {
    rng: ChaCha20Rng,
    seed: u64,
    /// Number of values drawn (for state reconstruction).
    steps: u64,
}

// Serialized as seed and step count; the stream is replayed on load.
#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct RandomState {
        seed: u64,
        steps: u64,
    }

    impl Serialize for Random {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            RandomState {
                seed: self.seed,
                steps: self.steps,
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Random {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let state = RandomState::deserialize(deserializer)?;
            let mut rng = ChaCha20Rng::seed_from_u64(state.seed);
            for _ in 0..state.steps {
                let _: f64 = rng.gen();
            }
            Ok(Random {
                rng,
                seed: state.seed,
                steps: state.steps,
            })
        }
    }
}

impl Random {
    /// Creates a generator with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
            steps: 0,
        }
    }

    /// Creates a generator seeded from the thread-local entropy source.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Returns the seed used for this generator.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of values drawn so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl RandomSource for Random {
    fn next_unit(&mut self) -> f64 {
        self.steps += 1;
        self.rng.gen()
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Random {
    fn clone(&self) -> Self {
        Self {
            rng: self.rng.clone(),
            seed: self.seed,
            steps: self.steps,
        }
    }
}

impl std::fmt::Debug for Random {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Random")
            .field("seed", &self.seed)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

/// Replays a fixed, cyclic sequence of unit values.
///
/// ```rust
/// use cardiosim::utils::{RandomSource, ScriptedSource};
///
/// let mut src = ScriptedSource::new(vec![0.1, 0.9]).unwrap();
/// assert!(src.chance(0.3));
/// assert!(!src.chance(0.3));
/// assert!(src.chance(0.3));
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Creates a source cycling through `values`, each of which must lie in
    /// `[0, 1)`.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(CardioError::InvalidParameter {
                name: "values",
                message: "Must contain at least one value".to_string(),
            });
        }
        if let Some(bad) = values.iter().find(|v| !(0.0..1.0).contains(*v)) {
            return Err(CardioError::InvalidParameter {
                name: "values",
                message: format!("Every value must lie in [0, 1), got {bad}"),
            });
        }
        Ok(Self { values, cursor: 0 })
    }

    /// A source that always returns the same value.
    pub fn constant(value: f64) -> Result<Self> {
        Self::new(vec![value])
    }

    /// Number of values drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
