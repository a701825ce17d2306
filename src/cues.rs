//! Heart-sound trigger events for audio front-ends.
//!
//! The engine exposes systole and diastole start times; an audio consumer
//! polling at frame rate wants discrete "play S1 now" events instead. A cue
//! fires when the poll time lands within 50 ms after the phase boundary, and
//! each sound is held off for 100 ms after it last fired so consecutive frames
//! inside the same window do not retrigger it.

use crate::model::PhysiologyModel;
use crate::types::Millis;
use crate::utils::RandomSource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width of the trigger window after a phase boundary (ms).
pub const TRIGGER_WINDOW_MS: Millis = 50.0;
/// Minimum spacing between two cues of the same sound (ms).
pub const DEBOUNCE_MS: Millis = 100.0;

/// The two heart sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeartSound {
    /// AV valve closure at the onset of systole.
    S1,
    /// Semilunar valve closure at the onset of diastole.
    S2,
}

/// Suggested synthesis envelope for a heart sound: a sine sweep with a short
/// linear attack and exponential release.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToneEnvelope {
    /// Start frequency (Hz).
    pub start_hz: f64,
    /// End frequency of the sweep (Hz).
    pub end_hz: f64,
    /// Sweep duration (ms).
    pub sweep_ms: Millis,
    /// Peak gain, reached after the attack.
    pub peak_gain: f64,
    /// Attack duration (ms).
    pub attack_ms: Millis,
    /// Total duration (ms).
    pub duration_ms: Millis,
}

impl HeartSound {
    /// Envelope for this sound. S2 is higher pitched and softer than S1.
    #[must_use]
    pub const fn tone(self) -> ToneEnvelope {
        match self {
            Self::S1 => ToneEnvelope {
                start_hz: 30.0,
                end_hz: 50.0,
                sweep_ms: 50.0,
                peak_gain: 0.8,
                attack_ms: 10.0,
                duration_ms: 100.0,
            },
            Self::S2 => ToneEnvelope {
                start_hz: 60.0,
                end_hz: 90.0,
                sweep_ms: 40.0,
                peak_gain: 0.6,
                attack_ms: 10.0,
                duration_ms: 80.0,
            },
        }
    }
}

/// Turns phase-boundary timestamps into debounced S1/S2 events.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeartSoundCues {
    last_s1: Option<Millis>,
    last_s2: Option<Millis>,
}

impl HeartSoundCues {
    /// Creates a cue tracker that has fired nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks both sounds at time `now`.
    ///
    /// `systole_start` and `diastole_start` are the current beat's phase
    /// boundaries, `None` before the first beat.
    pub fn poll(
        &mut self,
        now: Millis,
        systole_start: Option<Millis>,
        diastole_start: Option<Millis>,
    ) -> Vec<HeartSound> {
        let mut cues = Vec::with_capacity(2);
        if fire(&mut self.last_s1, now, systole_start) {
            cues.push(HeartSound::S1);
        }
        if fire(&mut self.last_s2, now, diastole_start) {
            cues.push(HeartSound::S2);
        }
        cues
    }

    /// [`poll`](Self::poll) against a model's current phase boundaries.
    pub fn poll_model<R: RandomSource>(
        &mut self,
        model: &PhysiologyModel<R>,
        now: Millis,
    ) -> Vec<HeartSound> {
        self.poll(now, model.systole_start_time(), model.diastole_start_time())
    }

    /// Time the given sound last fired.
    #[must_use]
    pub fn last_fired(&self, sound: HeartSound) -> Option<Millis> {
        match sound {
            HeartSound::S1 => self.last_s1,
            HeartSound::S2 => self.last_s2,
        }
    }
}

fn fire(last: &mut Option<Millis>, now: Millis, boundary: Option<Millis>) -> bool {
    let Some(start) = boundary else {
        return false;
    };
    if !(start..start + TRIGGER_WINDOW_MS).contains(&now) {
        return false;
    }
    if last.is_some_and(|previous| now - previous < DEBOUNCE_MS) {
        return false;
    }
    *last = Some(now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::utils::Random;

    #[test]
    fn test_fires_once_per_window() {
        let mut cues = HeartSoundCues::new();
        assert_eq!(cues.poll(1_000.0, Some(1_000.0), Some(1_300.0)), vec![HeartSound::S1]);
        assert!(cues.poll(1_016.0, Some(1_000.0), Some(1_300.0)).is_empty());
        assert!(cues.poll(1_049.0, Some(1_000.0), Some(1_300.0)).is_empty());

        assert_eq!(cues.poll(1_310.0, Some(1_000.0), Some(1_300.0)), vec![HeartSound::S2]);
        assert!(cues.poll(1_350.0, Some(1_000.0), Some(1_300.0)).is_empty());
        assert_eq!(cues.last_fired(HeartSound::S1), Some(1_000.0));
        assert_eq!(cues.last_fired(HeartSound::S2), Some(1_310.0));
    }

    #[test]
    fn test_outside_window_is_silent() {
        let mut cues = HeartSoundCues::new();
        assert!(cues.poll(999.0, Some(1_000.0), Some(1_300.0)).is_empty());
        assert!(cues.poll(1_050.0, Some(1_000.0), Some(1_300.0)).is_empty());
        assert!(cues.poll(500.0, None, None).is_empty());
    }

    #[test]
    fn test_debounce_across_beats() {
        let mut cues = HeartSoundCues::new();
        assert_eq!(cues.poll(0.0, Some(0.0), Some(300.0)), vec![HeartSound::S1]);
        // A new beat 80 ms later is still inside the hold-off.
        assert!(cues.poll(80.0, Some(80.0), Some(380.0)).is_empty());
        assert_eq!(cues.poll(120.0, Some(100.0), Some(400.0)), vec![HeartSound::S1]);
    }

    #[test]
    fn test_tones() {
        let s1 = HeartSound::S1.tone();
        let s2 = HeartSound::S2.tone();
        assert!(s1.start_hz < s2.start_hz);
        assert!(s1.peak_gain > s2.peak_gain);
        assert!(s2.duration_ms < s1.duration_ms);
    }

    #[test]
    fn test_poll_model_follows_beats() {
        let mut model =
            PhysiologyModel::with_random(SimulationConfig::default(), Random::new(3), 0.0).unwrap();
        let mut cues = HeartSoundCues::new();
        let mut heard = Vec::new();

        let mut t = 0.0;
        while t < 2_400.0 {
            model.tick(t).unwrap();
            for sound in cues.poll_model(&model, t) {
                heard.push((sound, t));
            }
            t += 16.0;
        }

        let s1 = heard.iter().filter(|(s, _)| *s == HeartSound::S1).count();
        let s2 = heard.iter().filter(|(s, _)| *s == HeartSound::S2).count();
        // Beats on the ticks at 0, 864 and 1728 ms.
        assert_eq!(s1, 3);
        assert_eq!(s2, 3);
    }
}
