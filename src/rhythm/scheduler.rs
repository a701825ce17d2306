//! Beat scheduling.

use tracing::{debug, trace};

use crate::config::{EcgTiming, SimulationConfig};
use crate::rhythm::{RhythmState, RrScaling};
use crate::types::{rr_from_bpm, Arrhythmia, Bpm, Millis, Parameters};
use crate::utils::RandomSource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fired heartbeat and the waveform decisions made for it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Beat {
    /// Onset time (ms).
    pub start: Millis,
    /// Interval until the following beat (ms).
    pub rr_interval: Millis,
    /// Onset of the QRS relative to `start` (ms).
    pub pr_interval: Millis,
    /// Rhythm in effect for this beat.
    pub arrhythmia: Arrhythmia,
    /// Beat was not conducted; no waveform is emitted for it.
    pub dropped: bool,
    /// T-wave is inverted (ischemic beats only).
    pub t_wave_inverted: bool,
}

/// Owns the beat timeline: last/next beat, RR interval and the systolic and
/// diastolic phase boundaries.
///
/// The first call to [`advance`](Self::advance) always fires a beat.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeatScheduler {
    state: RhythmState,
    current: Option<Beat>,
    previous: Option<Beat>,
    next_beat: Option<Millis>,
    rr_interval: Millis,
    scaling: RrScaling,
    systole_ms: Millis,
    ecg: EcgTiming,
    beats: u64,
}

impl BeatScheduler {
    /// Creates a scheduler for `params` with no beat fired yet.
    #[must_use]
    pub fn new(params: &Parameters, config: &SimulationConfig) -> Self {
        Self {
            state: RhythmState::new(params.arrhythmia, &config.ecg),
            current: None,
            previous: None,
            next_beat: None,
            rr_interval: rr_from_bpm(params.heart_rate),
            scaling: RrScaling::Relative(1.0),
            systole_ms: config.calibration.systole_duration_ms,
            ecg: config.ecg.clone(),
            beats: 0,
        }
    }

    /// Fires a beat if one is due at `now`.
    pub fn advance<R: RandomSource + ?Sized>(
        &mut self,
        now: Millis,
        params: &Parameters,
        rng: &mut R,
    ) -> Option<Beat> {
        if self.next_beat.is_some_and(|next| now < next) {
            return None;
        }

        let plan = self.state.plan(params.heart_rate, now, rng);
        let t_wave_inverted = params.ischemia && rng.chance(self.ecg.t_inversion_probability);

        let beat = Beat {
            start: now,
            rr_interval: plan.rr_interval,
            pr_interval: self.state.pr_interval(&self.ecg),
            arrhythmia: self.state.arrhythmia(),
            dropped: plan.dropped,
            t_wave_inverted,
        };

        self.previous = self.current.replace(beat);
        self.rr_interval = plan.rr_interval;
        self.scaling = plan.scaling;
        self.next_beat = Some(now + plan.rr_interval);
        self.beats += 1;

        trace!(
            time = now,
            rr = plan.rr_interval,
            rhythm = %beat.arrhythmia,
            dropped = beat.dropped,
            premature_next = plan.premature_next,
            "beat"
        );

        Some(beat)
    }

    /// Re-times the pending beat after a heart-rate change.
    ///
    /// The current interval keeps its multiple of the base RR (or its fixed
    /// length), so no randomness is drawn and alternation is not advanced.
    pub fn retime(&mut self, heart_rate: Bpm) {
        self.rr_interval = self.scaling.resolve(heart_rate);
        if let Some(beat) = self.current.as_mut() {
            beat.rr_interval = self.rr_interval;
            self.next_beat = Some(beat.start + self.rr_interval);
        }
    }

    /// Switches rhythm: resets all variant-local state and draws a fresh
    /// interval for the beat in progress.
    pub fn switch_rhythm<R: RandomSource + ?Sized>(&mut self, params: &Parameters, rng: &mut R) {
        debug!(from = %self.state.arrhythmia(), to = %params.arrhythmia, "switching rhythm");

        self.state = RhythmState::new(params.arrhythmia, &self.ecg);

        // Nothing in progress: the first beat will plan against fresh state.
        let Some(start) = self.current.map(|beat| beat.start) else {
            self.rr_interval = rr_from_bpm(params.heart_rate);
            self.scaling = RrScaling::Relative(1.0);
            return;
        };

        let plan = self.state.plan(params.heart_rate, start, rng);
        let pr_interval = self.state.pr_interval(&self.ecg);

        self.rr_interval = plan.rr_interval;
        self.scaling = plan.scaling;
        self.next_beat = Some(start + plan.rr_interval);

        if let Some(beat) = self.current.as_mut() {
            beat.rr_interval = plan.rr_interval;
            beat.pr_interval = pr_interval;
            beat.arrhythmia = params.arrhythmia;
            beat.dropped = plan.dropped;
        }
    }

    /// The beat whose waveform owns time `t`, if any beat started at or
    /// before it.
    #[must_use]
    pub fn beat_at(&self, t: Millis) -> Option<&Beat> {
        match (&self.current, &self.previous) {
            (Some(current), _) if current.start <= t => Some(current),
            (_, Some(previous)) if previous.start <= t => Some(previous),
            _ => None,
        }
    }

    /// Variant-local state.
    #[must_use]
    pub fn state(&self) -> &RhythmState {
        &self.state
    }

    /// Most recent beat.
    #[must_use]
    pub fn current_beat(&self) -> Option<&Beat> {
        self.current.as_ref()
    }

    /// Onset of the most recent beat.
    #[must_use]
    pub fn last_beat_time(&self) -> Option<Millis> {
        self.current.map(|beat| beat.start)
    }

    /// When the next beat is due; `None` means immediately.
    #[must_use]
    pub fn next_beat_time(&self) -> Option<Millis> {
        self.next_beat
    }

    /// Current RR interval (ms).
    #[must_use]
    pub fn rr_interval(&self) -> Millis {
        self.rr_interval
    }

    /// Start of mechanical systole of the current beat.
    #[must_use]
    pub fn systole_start_time(&self) -> Option<Millis> {
        self.last_beat_time()
    }

    /// Start of diastole of the current beat.
    #[must_use]
    pub fn diastole_start_time(&self) -> Option<Millis> {
        self.last_beat_time().map(|start| start + self.systole_ms)
    }

    /// Number of beats fired since construction.
    #[must_use]
    pub fn beat_count(&self) -> u64 {
        self.beats
    }
}
