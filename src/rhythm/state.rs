//! Variant-local rhythm control state and interval rules.

use crate::config::EcgTiming;
use crate::types::{rr_from_bpm, Arrhythmia, Bpm, Millis};
use crate::utils::RandomSource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ventricular escape rate in complete heart block.
pub const ESCAPE_RATE_BPM: Bpm = 40.0;

/// Atrial rate in atrial flutter.
pub const FLUTTER_ATRIAL_RATE_BPM: Bpm = 300.0;

/// Half-width of the atrial fibrillation RR spread, as a fraction of mean RR.
pub const AF_RR_SPREAD: f64 = 0.4;

/// Probability that a second-degree AV block beat is not conducted.
pub const AV_BLOCK_2_DROP_PROBABILITY: f64 = 0.3;

/// Probability that a PVC-rhythm beat is followed by a sinus interval.
pub const PVC_SINUS_PROBABILITY: f64 = 0.9;

/// Probability that a premature interval uses the longer coupling.
pub const PVC_LONG_COUPLING_PROBABILITY: f64 = 0.7;

const PVC_LONG_COUPLING: f64 = 0.6;
const PVC_SHORT_COUPLING: f64 = 0.4;
const BIGEMINY_COUPLING: f64 = 0.5;

/// How an interval relates to the configured heart rate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RrScaling {
    /// A multiple of `60000 / heart_rate`.
    Relative(f64),
    /// Independent of the configured heart rate.
    Fixed(Millis),
}

impl RrScaling {
    /// Resolves the interval for a heart rate.
    #[must_use]
    pub fn resolve(self, heart_rate: Bpm) -> Millis {
        match self {
            Self::Relative(multiple) => multiple * rr_from_bpm(heart_rate),
            Self::Fixed(rr) => rr,
        }
    }
}

/// Outcome of one interval draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatPlan {
    /// Interval until the next beat.
    pub rr_interval: Millis,
    /// How `rr_interval` scales with heart rate.
    pub scaling: RrScaling,
    /// The beat that owns this interval is not conducted.
    pub dropped: bool,
    /// The next beat arrives early.
    pub premature_next: bool,
}

/// Rhythm variant together with its variant-local control state.
///
/// Switching variants replaces the whole value, which resets that state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RhythmState {
    /// Normal sinus rhythm.
    Normal,
    /// Atrial fibrillation.
    AtrialFibrillation,
    /// Atrial flutter.
    AtrialFlutter,
    /// Occasional PVCs.
    Pvcs {
        /// Time of the most recent premature beat.
        last_premature: Option<Millis>,
    },
    /// Ventricular bigeminy.
    Bigeminy {
        /// The next interval is the short, premature one.
        premature_next: bool,
    },
    /// Ventricular tachycardia.
    VentricularTachycardia,
    /// Sinus bradycardia.
    SinusBradycardia,
    /// First-degree AV block.
    AvBlock1 {
        /// Prolonged PR interval (ms).
        pr_interval: Millis,
    },
    /// Second-degree AV block.
    AvBlock2 {
        /// The current beat was not conducted.
        dropped: bool,
    },
    /// Complete AV block.
    AvBlock3,
}

impl RhythmState {
    /// Fresh control state for a variant.
    #[must_use]
    pub fn new(arrhythmia: Arrhythmia, ecg: &EcgTiming) -> Self {
        match arrhythmia {
            Arrhythmia::Normal => Self::Normal,
            Arrhythmia::AtrialFibrillation => Self::AtrialFibrillation,
            Arrhythmia::AtrialFlutter => Self::AtrialFlutter,
            Arrhythmia::Pvcs => Self::Pvcs {
                last_premature: None,
            },
            Arrhythmia::Bigeminy => Self::Bigeminy {
                premature_next: false,
            },
            Arrhythmia::VentricularTachycardia => Self::VentricularTachycardia,
            Arrhythmia::SinusBradycardia => Self::SinusBradycardia,
            Arrhythmia::AvBlock1 => Self::AvBlock1 {
                pr_interval: ecg.pr_interval_ms * ecg.av_block_pr_factor,
            },
            Arrhythmia::AvBlock2 => Self::AvBlock2 { dropped: false },
            Arrhythmia::AvBlock3 => Self::AvBlock3,
        }
    }

    /// The variant tag.
    #[must_use]
    pub fn arrhythmia(&self) -> Arrhythmia {
        match self {
            Self::Normal => Arrhythmia::Normal,
            Self::AtrialFibrillation => Arrhythmia::AtrialFibrillation,
            Self::AtrialFlutter => Arrhythmia::AtrialFlutter,
            Self::Pvcs { .. } => Arrhythmia::Pvcs,
            Self::Bigeminy { .. } => Arrhythmia::Bigeminy,
            Self::VentricularTachycardia => Arrhythmia::VentricularTachycardia,
            Self::SinusBradycardia => Arrhythmia::SinusBradycardia,
            Self::AvBlock1 { .. } => Arrhythmia::AvBlock1,
            Self::AvBlock2 { .. } => Arrhythmia::AvBlock2,
            Self::AvBlock3 => Arrhythmia::AvBlock3,
        }
    }

    /// PR interval of conducted beats; zero when no P-wave precedes the QRS.
    #[must_use]
    pub fn pr_interval(&self, ecg: &EcgTiming) -> Millis {
        match self {
            Self::AvBlock1 { pr_interval } => *pr_interval,
            other if other.arrhythmia().has_p_wave() => ecg.pr_interval_ms,
            _ => 0.0,
        }
    }

    /// Draws the interval following a beat fired at `beat_time`.
    pub fn plan<R: RandomSource + ?Sized>(
        &mut self,
        heart_rate: Bpm,
        beat_time: Millis,
        rng: &mut R,
    ) -> BeatPlan {
        let mut dropped = false;
        let mut premature_next = false;

        let scaling = match self {
            Self::Normal
            | Self::SinusBradycardia
            | Self::AvBlock1 { .. }
            | Self::VentricularTachycardia => RrScaling::Relative(1.0),
            Self::AvBlock2 { dropped: flag } => {
                *flag = rng.chance(AV_BLOCK_2_DROP_PROBABILITY);
                dropped = *flag;
                RrScaling::Relative(1.0)
            }
            Self::AvBlock3 => RrScaling::Fixed(rr_from_bpm(ESCAPE_RATE_BPM)),
            Self::AtrialFibrillation => RrScaling::Relative(
                rng.uniform(1.0 - AF_RR_SPREAD, 1.0 + AF_RR_SPREAD),
            ),
            Self::AtrialFlutter => {
                let block_ratio = if rng.chance(0.7) {
                    2.0
                } else if rng.chance(0.5) {
                    3.0
                } else {
                    4.0
                };
                RrScaling::Fixed(rr_from_bpm(FLUTTER_ATRIAL_RATE_BPM) * block_ratio)
            }
            Self::Pvcs { last_premature } => {
                if rng.chance(PVC_SINUS_PROBABILITY) {
                    RrScaling::Relative(1.0)
                } else {
                    let coupling = if rng.chance(PVC_LONG_COUPLING_PROBABILITY) {
                        PVC_LONG_COUPLING
                    } else {
                        PVC_SHORT_COUPLING
                    };
                    premature_next = true;
                    *last_premature = Some(beat_time + coupling * rr_from_bpm(heart_rate));
                    RrScaling::Relative(coupling)
                }
            }
            Self::Bigeminy {
                premature_next: flag,
            } => {
                let multiple = if *flag { BIGEMINY_COUPLING } else { 1.0 };
                premature_next = *flag;
                *flag = !*flag;
                RrScaling::Relative(multiple)
            }
        };

        BeatPlan {
            rr_interval: scaling.resolve(heart_rate),
            scaling,
            dropped,
            premature_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{Random, ScriptedSource};

    fn ecg() -> EcgTiming {
        EcgTiming::default()
    }

    #[test]
    fn test_round_trip_tag() {
        for variant in Arrhythmia::ALL {
            assert_eq!(RhythmState::new(variant, &ecg()).arrhythmia(), variant);
        }
    }

    #[test]
    fn test_pr_interval_per_variant() {
        let timing = ecg();
        assert_eq!(RhythmState::new(Arrhythmia::Normal, &timing).pr_interval(&timing), 160.0);
        assert_eq!(RhythmState::new(Arrhythmia::AvBlock1, &timing).pr_interval(&timing), 240.0);
        assert_eq!(RhythmState::new(Arrhythmia::AvBlock3, &timing).pr_interval(&timing), 0.0);
        assert_eq!(
            RhythmState::new(Arrhythmia::AtrialFibrillation, &timing).pr_interval(&timing),
            0.0
        );
    }

    #[test]
    fn test_av_block_3_ignores_heart_rate() {
        let mut rng = Random::new(1);
        let mut state = RhythmState::new(Arrhythmia::AvBlock3, &ecg());
        for hr in [30.0, 70.0, 180.0] {
            let plan = state.plan(hr, 0.0, &mut rng);
            assert_eq!(plan.rr_interval, 1500.0);
            assert_eq!(plan.scaling.resolve(hr * 2.0), 1500.0);
        }
    }

    #[test]
    fn test_flutter_block_ratios() {
        // 0.1 < 0.7 -> 2:1
        let mut src = ScriptedSource::constant(0.1).unwrap();
        let mut state = RhythmState::new(Arrhythmia::AtrialFlutter, &ecg());
        assert_eq!(state.plan(70.0, 0.0, &mut src).rr_interval, 400.0);

        // 0.8 fails the 2:1 draw, 0.2 takes 3:1
        let mut src = ScriptedSource::new(vec![0.8, 0.2]).unwrap();
        assert_eq!(state.plan(70.0, 0.0, &mut src).rr_interval, 600.0);

        // 0.8 then 0.9 -> 4:1
        let mut src = ScriptedSource::new(vec![0.8, 0.9]).unwrap();
        assert_eq!(state.plan(70.0, 0.0, &mut src).rr_interval, 800.0);
    }

    #[test]
    fn test_pvc_branches() {
        let mut state = RhythmState::new(Arrhythmia::Pvcs, &ecg());

        let mut sinus = ScriptedSource::constant(0.5).unwrap();
        let plan = state.plan(60.0, 0.0, &mut sinus);
        assert_eq!(plan.rr_interval, 1000.0);
        assert!(!plan.premature_next);

        let mut long = ScriptedSource::new(vec![0.95, 0.1]).unwrap();
        let plan = state.plan(60.0, 2000.0, &mut long);
        assert!((plan.rr_interval - 600.0).abs() < 1e-9);
        assert!(plan.premature_next);
        assert_eq!(
            state,
            RhythmState::Pvcs {
                last_premature: Some(2600.0)
            }
        );

        let mut short = ScriptedSource::new(vec![0.95, 0.8]).unwrap();
        let plan = state.plan(60.0, 0.0, &mut short);
        assert!((plan.rr_interval - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_av_block_2_drop_flag() {
        let mut state = RhythmState::new(Arrhythmia::AvBlock2, &ecg());
        let mut src = ScriptedSource::new(vec![0.1, 0.5]).unwrap();

        let plan = state.plan(70.0, 0.0, &mut src);
        assert!(plan.dropped);
        assert_eq!(state, RhythmState::AvBlock2 { dropped: true });

        let plan = state.plan(70.0, 0.0, &mut src);
        assert!(!plan.dropped);
    }

    #[test]
    fn test_bigeminy_alternates() {
        let mut rng = Random::new(3);
        let mut state = RhythmState::new(Arrhythmia::Bigeminy, &ecg());
        let intervals: Vec<Millis> = (0..6)
            .map(|_| state.plan(60.0, 0.0, &mut rng).rr_interval)
            .collect();
        assert_eq!(intervals, vec![1000.0, 500.0, 1000.0, 500.0, 1000.0, 500.0]);
    }

    #[test]
    fn test_af_interval_bounds() {
        let mut rng = Random::new(11);
        let mut state = RhythmState::new(Arrhythmia::AtrialFibrillation, &ecg());
        for _ in 0..1000 {
            let rr = state.plan(120.0, 0.0, &mut rng).rr_interval;
            assert!((300.0..=700.0).contains(&rr));
        }
    }
}
