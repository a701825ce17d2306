//! Phonocardiogram synthesizer.

use crate::config::PcgTiming;
use crate::types::{Millis, PcgPoint};
use crate::utils::RandomSource;
use crate::waveforms::{half_sine, SampleContext, Synthesizer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// S1 and S2 heart-sound bursts.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PcgSynthesizer {
    systole_ms: Millis,
    timing: PcgTiming,
}

impl PcgSynthesizer {
    /// Creates a synthesizer; S2 is placed relative to the end of systole.
    #[must_use]
    pub fn new(systole_ms: Millis, timing: PcgTiming) -> Self {
        Self { systole_ms, timing }
    }

    /// S1 window `[start, end)` relative to beat onset.
    #[must_use]
    pub fn s1_window(&self) -> (Millis, Millis) {
        let start = self.timing.s1_onset_ms;
        (start, start + self.timing.s1_duration_ms)
    }

    /// S2 window `[start, end)` relative to beat onset.
    #[must_use]
    pub fn s2_window(&self) -> (Millis, Millis) {
        let start = self.systole_ms + self.timing.s2_delay_ms;
        (start, start + self.timing.s2_duration_ms)
    }
}

impl Synthesizer for PcgSynthesizer {
    type Sample = PcgPoint;

    fn synthesize<R: RandomSource + ?Sized>(
        &self,
        time: Millis,
        ctx: &SampleContext<'_>,
        _rng: &mut R,
    ) -> PcgPoint {
        let mut point = PcgPoint {
            time,
            ..Default::default()
        };
        let Some(t) = ctx.time_since_beat(time) else {
            return point;
        };

        let (s1_start, s1_end) = self.s1_window();
        if (s1_start..s1_end).contains(&t) {
            point.s1 = true;
            point.amplitude = half_sine(t - s1_start, s1_end - s1_start);
        }

        let (s2_start, s2_end) = self.s2_window();
        if (s2_start..s2_end).contains(&t) {
            point.s2 = true;
            point.amplitude = self.timing.s2_gain * half_sine(t - s2_start, s2_end - s2_start);
        }

        point
    }
}
