//! Waveform synthesizers.
//!
//! Each synthesizer maps a sample time, and the beat that owns it, to one
//! buffer sample. Shapes are closed-form approximations:
//!
//! - [`EcgSynthesizer`]: half-sine P and T waves, three-segment QRS, ST offset
//! - [`PressureSynthesizer`]: piecewise-linear systole, exponential diastole
//! - [`PcgSynthesizer`]: half-sine S1 and S2 bursts
//! - [`Spo2Synthesizer`]: filtered saturation with measurement jitter
//!
//! Before the first beat every synthesizer emits its flat baseline.

mod ecg;
mod pcg;
mod pressure;
mod spo2;

pub use ecg::EcgSynthesizer;
pub use pcg::PcgSynthesizer;
pub use pressure::PressureSynthesizer;
pub use spo2::Spo2Synthesizer;

use crate::rhythm::Beat;
use crate::types::{Indicators, Millis, Percent, TimedSample};
use crate::utils::RandomSource;

/// Everything a synthesizer may read besides the sample time.
#[derive(Debug, Clone, Copy)]
pub struct SampleContext<'a> {
    /// Beat owning the sample, `None` before the first beat.
    pub beat: Option<&'a Beat>,
    /// Indicators as of this tick.
    pub indicators: &'a Indicators,
    /// Ischemia currently active.
    pub ischemia: bool,
    /// Filtered oxygen saturation.
    pub spo2: Percent,
}

impl SampleContext<'_> {
    /// Time since the owning beat's onset, if there is one.
    #[must_use]
    pub fn time_since_beat(&self, time: Millis) -> Option<Millis> {
        self.beat.map(|beat| time - beat.start)
    }
}

/// Trait for all waveform synthesizers.
pub trait Synthesizer {
    /// Sample type produced.
    type Sample: TimedSample;

    /// Produces the sample at absolute time `time`.
    fn synthesize<R: RandomSource + ?Sized>(
        &self,
        time: Millis,
        ctx: &SampleContext<'_>,
        rng: &mut R,
    ) -> Self::Sample;
}

/// Half-sine bump over `[0, duration)`, zero-based `t`.
#[inline]
pub(crate) fn half_sine(t: Millis, duration: Millis) -> f64 {
    (std::f64::consts::PI * t / duration).sin()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::Arrhythmia;

    pub fn beat(arrhythmia: Arrhythmia) -> Beat {
        Beat {
            start: 1_000.0,
            rr_interval: 1_000.0,
            pr_interval: if arrhythmia.has_p_wave() { 160.0 } else { 0.0 },
            arrhythmia,
            dropped: false,
            t_wave_inverted: false,
        }
    }

    pub fn ctx<'a>(beat: Option<&'a Beat>, indicators: &'a Indicators) -> SampleContext<'a> {
        SampleContext {
            beat,
            indicators,
            ischemia: false,
            spo2: 98.0,
        }
    }
}
