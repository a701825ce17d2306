//! Pulse-oximetry trace.

use crate::hemodynamics::SPO2_FLOOR;
use crate::types::{Millis, Spo2Point};
use crate::utils::RandomSource;
use crate::waveforms::{SampleContext, Synthesizer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Filtered SpO2 with uniform measurement jitter, clamped to `[70, 100]`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spo2Synthesizer {
    jitter: f64,
}

impl Spo2Synthesizer {
    /// Creates a synthesizer with jitter in `[-jitter, jitter)`.
    #[must_use]
    pub fn new(jitter: f64) -> Self {
        Self { jitter }
    }
}

impl Synthesizer for Spo2Synthesizer {
    type Sample = Spo2Point;

    fn synthesize<R: RandomSource + ?Sized>(
        &self,
        time: Millis,
        ctx: &SampleContext<'_>,
        rng: &mut R,
    ) -> Spo2Point {
        let noise = rng.uniform(-self.jitter, self.jitter);
        Spo2Point {
            time,
            spo2: (ctx.spo2 + noise).clamp(SPO2_FLOOR, 100.0),
        }
    }
}
