//! Arterial pressure synthesizer.

use crate::config::PressureShape;
use crate::types::{Millis, PressurePoint};
use crate::utils::RandomSource;
use crate::waveforms::{SampleContext, Synthesizer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Arterial pressure curve.
///
/// Systole (`[0, systole)` after onset) is two linear ramps: diastolic up to
/// systolic over the upstroke fraction, then back down to diastolic. Diastole
/// decays exponentially from systolic toward diastolic, scaled by the beat's
/// RR interval.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PressureSynthesizer {
    systole_ms: Millis,
    shape: PressureShape,
}

impl PressureSynthesizer {
    /// Creates a synthesizer for a given systole duration.
    #[must_use]
    pub fn new(systole_ms: Millis, shape: PressureShape) -> Self {
        Self { systole_ms, shape }
    }
}

impl Synthesizer for PressureSynthesizer {
    type Sample = PressurePoint;

    fn synthesize<R: RandomSource + ?Sized>(
        &self,
        time: Millis,
        ctx: &SampleContext<'_>,
        _rng: &mut R,
    ) -> PressurePoint {
        let sbp = f64::from(ctx.indicators.systolic_bp);
        let dbp = f64::from(ctx.indicators.diastolic_bp);
        let pulse = sbp - dbp;

        let Some(beat) = ctx.beat else {
            return PressurePoint {
                time,
                pressure: dbp,
                is_systolic: false,
            };
        };

        let t = time - beat.start;
        if t < self.systole_ms {
            let progress = t / self.systole_ms;
            let upstroke = self.shape.upstroke_fraction;
            let pressure = if progress < upstroke {
                dbp + pulse * (progress / upstroke)
            } else {
                sbp - pulse * ((progress - upstroke) / (1.0 - upstroke))
            };
            PressurePoint {
                time,
                pressure,
                is_systolic: true,
            }
        } else {
            let progress = (t - self.systole_ms) / beat.rr_interval;
            PressurePoint {
                time,
                pressure: dbp + pulse * (-self.shape.diastolic_decay * progress).exp(),
                is_systolic: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Arrhythmia, Indicators};
    use crate::utils::Random;
    use crate::waveforms::test_support::{beat, ctx};

    fn synth() -> PressureSynthesizer {
        PressureSynthesizer::new(300.0, PressureShape::default())
    }

    #[test]
    fn test_diastolic_before_first_beat() {
        let ind = Indicators::baseline();
        let point = synth().synthesize(0.0, &ctx(None, &ind), &mut Random::new(0));
        assert_eq!(point.pressure, 80.0);
        assert!(!point.is_systolic);
    }

    #[test]
    fn test_systolic_ramp() {
        let beat = beat(Arrhythmia::Normal);
        let ind = Indicators::baseline();
        let c = ctx(Some(&beat), &ind);
        let mut rng = Random::new(0);

        let onset = synth().synthesize(beat.start, &c, &mut rng);
        assert!(onset.is_systolic);
        assert!((onset.pressure - 80.0).abs() < 1e-9);

        let peak = synth().synthesize(beat.start + 90.0, &c, &mut rng);
        assert!((peak.pressure - 120.0).abs() < 1e-9);

        let falling = synth().synthesize(beat.start + 195.0, &c, &mut rng);
        assert!((falling.pressure - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_diastolic_decay() {
        let beat = beat(Arrhythmia::Normal);
        let ind = Indicators::baseline();
        let c = ctx(Some(&beat), &ind);
        let mut rng = Random::new(0);

        let start = synth().synthesize(beat.start + 300.0, &c, &mut rng);
        assert!(!start.is_systolic);
        assert!((start.pressure - 120.0).abs() < 1e-9);

        let mut previous = start.pressure;
        for offset in (310..1000).step_by(10) {
            let point = synth().synthesize(beat.start + offset as Millis, &c, &mut rng);
            assert!(point.pressure < previous);
            assert!(point.pressure > 80.0);
            previous = point.pressure;
        }
    }
}
