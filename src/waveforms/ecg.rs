//! ECG synthesizer.

use crate::config::EcgTiming;
use crate::types::{Arrhythmia, EcgPoint, Millis};
use crate::utils::RandomSource;
use crate::waveforms::{half_sine, SampleContext, Synthesizer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const P_AMPLITUDE: f64 = 0.25;
const Q_DEPTH: f64 = 0.2;
const R_HEIGHT: f64 = 1.0;
const S_SWING: f64 = 1.2;
const T_AMPLITUDE: f64 = 0.3;
const T_INVERSION_GAIN: f64 = -0.8;

// Fractions of the QRS spent on the Q and R deflections; S takes the rest.
const Q_FRACTION: f64 = 0.2;
const R_FRACTION: f64 = 0.4;

/// Single-lead ECG synthesizer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EcgSynthesizer {
    timing: EcgTiming,
}

impl EcgSynthesizer {
    /// Creates a synthesizer with the given segment timing.
    #[must_use]
    pub fn new(timing: EcgTiming) -> Self {
        Self { timing }
    }

    /// QRS duration for a rhythm.
    #[must_use]
    pub fn qrs_duration(&self, arrhythmia: Arrhythmia) -> Millis {
        if arrhythmia == Arrhythmia::VentricularTachycardia {
            self.timing.qrs_duration_ms * self.timing.vt_qrs_widening
        } else {
            self.timing.qrs_duration_ms
        }
    }

    /// Q, R and S deflections, `t` measured from QRS onset.
    fn qrs_voltage(t: Millis, duration: Millis) -> f64 {
        let q_end = duration * Q_FRACTION;
        let r_end = duration * (Q_FRACTION + R_FRACTION);
        let s_len = duration - r_end;

        if t < q_end {
            -Q_DEPTH * (t / q_end)
        } else if t < r_end {
            R_HEIGHT * ((t - q_end) / (r_end - q_end))
        } else {
            R_HEIGHT - S_SWING * ((t - r_end) / s_len)
        }
    }
}

impl Synthesizer for EcgSynthesizer {
    type Sample = EcgPoint;

    fn synthesize<R: RandomSource + ?Sized>(
        &self,
        time: Millis,
        ctx: &SampleContext<'_>,
        _rng: &mut R,
    ) -> EcgPoint {
        let mut point = EcgPoint {
            time,
            ..Default::default()
        };

        let Some(beat) = ctx.beat else {
            return point;
        };
        if beat.dropped {
            return point;
        }

        let t = time - beat.start;
        let has_p_wave = beat.arrhythmia.has_p_wave();
        let timing = &self.timing;

        if has_p_wave && (0.0..timing.p_duration_ms).contains(&t) {
            point.p_wave = true;
            point.voltage = P_AMPLITUDE * half_sine(t, timing.p_duration_ms);
        }

        let qrs_start = if has_p_wave { beat.pr_interval } else { 0.0 };
        let qrs_duration = self.qrs_duration(beat.arrhythmia);
        let qrs_end = qrs_start + qrs_duration;

        if (qrs_start..qrs_end).contains(&t) {
            point.qrs_complex = true;
            point.voltage = Self::qrs_voltage(t - qrs_start, qrs_duration);
            if beat.arrhythmia == Arrhythmia::VentricularTachycardia {
                point.voltage *= timing.vt_qrs_gain;
            }
        }

        let st_end = qrs_end + timing.st_duration_ms;
        if (qrs_end..st_end).contains(&t) {
            point.st_segment = if ctx.ischemia {
                timing.ischemic_st_offset
            } else {
                0.0
            };
            point.voltage = point.st_segment;
        }

        let t_end = st_end + timing.t_duration_ms;
        if (st_end..t_end).contains(&t) {
            point.t_wave = true;
            point.voltage = T_AMPLITUDE * half_sine(t - st_end, timing.t_duration_ms);
            if beat.t_wave_inverted {
                point.voltage *= T_INVERSION_GAIN;
            }
        }

        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Indicators;
    use crate::utils::Random;
    use crate::waveforms::test_support::{beat, ctx};

    fn sample_at(arrhythmia: Arrhythmia, offset: Millis) -> EcgPoint {
        let beat = beat(arrhythmia);
        let ind = Indicators::baseline();
        let synth = EcgSynthesizer::new(EcgTiming::default());
        synth.synthesize(beat.start + offset, &ctx(Some(&beat), &ind), &mut Random::new(0))
    }

    #[test]
    fn test_flat_before_first_beat() {
        let ind = Indicators::baseline();
        let synth = EcgSynthesizer::new(EcgTiming::default());
        let point = synth.synthesize(10.0, &ctx(None, &ind), &mut Random::new(0));
        assert_eq!(point, EcgPoint { time: 10.0, ..Default::default() });
    }

    #[test]
    fn test_normal_segments() {
        let p = sample_at(Arrhythmia::Normal, 40.0);
        assert!(p.p_wave);
        assert!((p.voltage - 0.25).abs() < 1e-9);

        // R peak at 160 + 0.6 * 80
        let r = sample_at(Arrhythmia::Normal, 208.0);
        assert!(r.qrs_complex);
        assert!((r.voltage - 1.0).abs() < 1e-9);

        let q = sample_at(Arrhythmia::Normal, 170.0);
        assert!(q.voltage < 0.0);

        let st = sample_at(Arrhythmia::Normal, 260.0);
        assert!(!st.qrs_complex && !st.t_wave);
        assert_eq!(st.voltage, 0.0);

        // T peak at 320 + 80
        let t = sample_at(Arrhythmia::Normal, 400.0);
        assert!(t.t_wave);
        assert!((t.voltage - 0.3).abs() < 1e-9);

        let late = sample_at(Arrhythmia::Normal, 600.0);
        assert_eq!(late.voltage, 0.0);
    }

    #[test]
    fn test_no_p_wave_in_complete_block() {
        for offset in (0..1000).step_by(10) {
            let point = sample_at(Arrhythmia::AvBlock3, offset as Millis);
            assert!(!point.p_wave);
        }
        assert!(sample_at(Arrhythmia::AvBlock3, 0.0).qrs_complex);
    }

    #[test]
    fn test_vt_qrs_wider_and_damped() {
        let synth = EcgSynthesizer::new(EcgTiming::default());
        assert_eq!(synth.qrs_duration(Arrhythmia::VentricularTachycardia), 120.0);

        // R peak at 0.6 * 120
        let r = sample_at(Arrhythmia::VentricularTachycardia, 72.0);
        assert!(r.qrs_complex);
        assert!((r.voltage - 0.8).abs() < 1e-9);
        assert!(sample_at(Arrhythmia::VentricularTachycardia, 100.0).qrs_complex);
    }

    #[test]
    fn test_dropped_beat_is_flat() {
        let mut dropped = beat(Arrhythmia::AvBlock2);
        dropped.dropped = true;
        let ind = Indicators::baseline();
        let synth = EcgSynthesizer::new(EcgTiming::default());

        for offset in (0..1000).step_by(10) {
            let point = synth.synthesize(
                dropped.start + offset as Millis,
                &ctx(Some(&dropped), &ind),
                &mut Random::new(0),
            );
            assert_eq!(point.voltage, 0.0);
            assert!(!point.p_wave && !point.qrs_complex && !point.t_wave);
        }
    }

    #[test]
    fn test_ischemic_st_and_inverted_t() {
        let mut ischemic = beat(Arrhythmia::Normal);
        ischemic.t_wave_inverted = true;
        let ind = Indicators::baseline();
        let synth = EcgSynthesizer::new(EcgTiming::default());
        let mut sample_ctx = ctx(Some(&ischemic), &ind);
        sample_ctx.ischemia = true;

        let st = synth.synthesize(ischemic.start + 260.0, &sample_ctx, &mut Random::new(0));
        assert_eq!(st.st_segment, -0.15);
        assert_eq!(st.voltage, -0.15);

        let t = synth.synthesize(ischemic.start + 400.0, &sample_ctx, &mut Random::new(0));
        assert!((t.voltage + 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_prolonged_pr_delays_qrs() {
        let mut block = beat(Arrhythmia::AvBlock1);
        block.pr_interval = 240.0;
        let ind = Indicators::baseline();
        let synth = EcgSynthesizer::new(EcgTiming::default());
        let early = synth.synthesize(block.start + 200.0, &ctx(Some(&block), &ind), &mut Random::new(0));
        let late = synth.synthesize(block.start + 250.0, &ctx(Some(&block), &ind), &mut Random::new(0));
        assert!(!early.qrs_complex);
        assert!(late.qrs_complex);
    }
}
