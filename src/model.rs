//! The simulation engine.
//!
//! [`PhysiologyModel`] owns all engine state: parameters, indicators, the
//! beat scheduler, both tracking filters, the baroreflex and the four sample
//! windows. It is driven by externally supplied timestamps; every call to
//! [`tick`](PhysiologyModel::tick) runs, in order:
//!
//! 1. beat scheduling (fires at most one beat)
//! 2. tracking-filter step over the elapsed time
//! 3. indicator recompute from parameters and filtered values
//! 4. buffer refill (ECG, pressure, SpO2, PCG)
//! 5. baroreflex adjustment of heart rate
//!
//! Consumers read the accessors after each tick.

use std::mem;

use tracing::{debug, info, warn};

use crate::buffers::WindowedBuffer;
use crate::config::SimulationConfig;
use crate::error::{CardioError, Result};
use crate::hemodynamics::{
    compute_indicators, contractility_target, spo2_target, Baroreflex, TrackingFilter,
};
use crate::rhythm::{Beat, BeatScheduler};
use crate::types::{
    EcgPoint, Indicators, Millis, ParamUpdate, Parameters, PcgPoint, Percent, Preset,
    PressurePoint, Spo2Point,
};
use crate::utils::{Random, RandomSource};
use crate::waveforms::{
    EcgSynthesizer, PcgSynthesizer, PressureSynthesizer, SampleContext, Spo2Synthesizer,
    Synthesizer,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cardiac physiology simulation engine.
///
/// Generic over its random source so tests and replays can inject a
/// deterministic one; the default is a seeded ChaCha20 [`Random`].
///
/// # Example
///
/// ```rust
/// use cardiosim::config::SimulationConfig;
/// use cardiosim::model::PhysiologyModel;
/// use cardiosim::types::ParamUpdate;
/// use cardiosim::utils::Random;
///
/// let mut model =
///     PhysiologyModel::with_random(SimulationConfig::default(), Random::new(1), 0.0).unwrap();
///
/// let beat = model.tick(10.0).unwrap();
/// assert!(beat.is_some());
///
/// model
///     .update_params(ParamUpdate {
///         heart_rate: Some(120.0),
///         ..Default::default()
///     })
///     .unwrap();
/// assert_eq!(model.next_beat_time(), Some(510.0));
/// ```
///
/// With the `serde` feature a model serializes as a checkpoint of its
/// configuration, random stream and engine state. Loading a checkpoint runs
/// the same validation as construction and parameter updates, and rebuilds
/// the synthesizers and baroreflex from the stored configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Checkpoint<R>", bound(deserialize = "R: Deserialize<'de>"))
)]
pub struct PhysiologyModel<R = Random> {
    config: SimulationConfig,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    synthesizers: Synthesizers,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    baroreflex: Baroreflex,
    rng: R,
    state: EngineState,
}

/// Wire form of a [`PhysiologyModel`]; field order matches its serialized
/// fields.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct Checkpoint<R> {
    config: SimulationConfig,
    rng: R,
    state: EngineState,
}

#[cfg(feature = "serde")]
impl<R> TryFrom<Checkpoint<R>> for PhysiologyModel<R> {
    type Error = CardioError;

    fn try_from(checkpoint: Checkpoint<R>) -> Result<Self> {
        let Checkpoint { config, rng, state } = checkpoint;
        config.validate()?;
        state.validate(&config)?;

        Ok(Self {
            synthesizers: Synthesizers::new(&config),
            baroreflex: Baroreflex::new(config.baroreflex.clone()),
            config,
            rng,
            state,
        })
    }
}

/// Waveform generators built once from configuration.
#[derive(Debug, Clone)]
struct Synthesizers {
    ecg: EcgSynthesizer,
    pressure: PressureSynthesizer,
    spo2: Spo2Synthesizer,
    pcg: PcgSynthesizer,
}

impl Synthesizers {
    fn new(config: &SimulationConfig) -> Self {
        let systole = config.calibration.systole_duration_ms;
        Self {
            ecg: EcgSynthesizer::new(config.ecg.clone()),
            pressure: PressureSynthesizer::new(systole, config.pressure.clone()),
            spo2: Spo2Synthesizer::new(config.oximetry.jitter),
            pcg: PcgSynthesizer::new(systole, config.pcg.clone()),
        }
    }
}

/// Everything `reset` replaces.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct EngineState {
    params: Parameters,
    indicators: Indicators,
    scheduler: BeatScheduler,
    spo2: TrackingFilter,
    contractility: TrackingFilter,
    compensating: bool,
    last_tick: Millis,
    ticks: u64,
    ecg: WindowedBuffer<EcgPoint>,
    pressure: WindowedBuffer<PressurePoint>,
    spo2_trace: WindowedBuffer<Spo2Point>,
    pcg: WindowedBuffer<PcgPoint>,
}

impl EngineState {
    /// Resting patient with one window of flat history ending at `now`.
    fn baseline(config: &SimulationConfig, now: Millis) -> Self {
        let cal = &config.calibration;
        let params = Parameters::default();
        let indicators = compute_indicators(&params, params.contractility, cal.base_spo2, cal);

        let buffers = &config.buffers;
        let mut ecg = WindowedBuffer::new(buffers.waveform_period_ms, buffers.window_ms);
        let mut pressure = WindowedBuffer::new(buffers.waveform_period_ms, buffers.window_ms);
        let mut spo2_trace = WindowedBuffer::new(buffers.spo2_period_ms, buffers.window_ms);
        let mut pcg = WindowedBuffer::new(buffers.waveform_period_ms, buffers.window_ms);

        let diastolic = f64::from(indicators.diastolic_bp);
        let saturation = f64::from(indicators.spo2);
        ecg.prefill(now, |time| EcgPoint {
            time,
            ..Default::default()
        });
        pressure.prefill(now, |time| PressurePoint {
            time,
            pressure: diastolic,
            is_systolic: false,
        });
        spo2_trace.prefill(now, |time| Spo2Point {
            time,
            spo2: saturation,
        });
        pcg.prefill(now, |time| PcgPoint {
            time,
            ..Default::default()
        });

        Self {
            scheduler: BeatScheduler::new(&params, config),
            spo2: TrackingFilter::new(cal.base_spo2, config.filters.spo2_response_ms),
            contractility: TrackingFilter::new(
                params.contractility,
                config.filters.contractility_response_ms,
            ),
            params,
            indicators,
            compensating: false,
            last_tick: now,
            ticks: 0,
            ecg,
            pressure,
            spo2_trace,
            pcg,
        }
    }

    /// Consistency checks for state that did not come from [`baseline`].
    ///
    /// [`baseline`]: Self::baseline
    #[cfg_attr(not(feature = "serde"), allow(dead_code))]
    fn validate(&self, config: &SimulationConfig) -> Result<()> {
        check_timestamp(self.last_tick)?;
        self.params.validate()?;

        let scheduler = &self.scheduler;
        let rr = scheduler.rr_interval();
        if !rr.is_finite() || rr <= 0.0 {
            return Err(CardioError::InvalidParameter {
                name: "rr_interval",
                message: format!("Must be > 0, got {rr}"),
            });
        }
        for time in [scheduler.last_beat_time(), scheduler.next_beat_time()]
            .into_iter()
            .flatten()
        {
            check_timestamp(time)?;
        }

        let filters = [
            ("spo2_filter", &self.spo2),
            ("contractility_filter", &self.contractility),
        ];
        for (name, filter) in filters {
            let response = filter.response_time();
            if !filter.current().is_finite()
                || !filter.target().is_finite()
                || !response.is_finite()
                || response <= 0.0
            {
                return Err(CardioError::InvalidParameter {
                    name,
                    message: format!("Non-finite or non-positive filter state: {filter:?}"),
                });
            }
        }

        let buffers = &config.buffers;
        let (wave, spo2, window) = (
            buffers.waveform_period_ms,
            buffers.spo2_period_ms,
            buffers.window_ms,
        );
        check_layout("ecg_buffer", self.ecg.period(), self.ecg.window(), wave, window)?;
        check_layout(
            "pressure_buffer",
            self.pressure.period(),
            self.pressure.window(),
            wave,
            window,
        )?;
        check_layout(
            "spo2_buffer",
            self.spo2_trace.period(),
            self.spo2_trace.window(),
            spo2,
            window,
        )?;
        check_layout("pcg_buffer", self.pcg.period(), self.pcg.window(), wave, window)?;
        Ok(())
    }
}

/// Borrowed view used while refilling buffers.
struct Frame<'a> {
    scheduler: &'a BeatScheduler,
    indicators: &'a Indicators,
    ischemia: bool,
    spo2: Percent,
}

impl Frame<'_> {
    fn fill<S, R>(
        &self,
        buffer: &mut WindowedBuffer<S::Sample>,
        synth: &S,
        now: Millis,
        rng: &mut R,
    ) -> usize
    where
        S: Synthesizer,
        R: RandomSource + ?Sized,
    {
        buffer.refill(now, |time| {
            let ctx = SampleContext {
                beat: self.scheduler.beat_at(time),
                indicators: self.indicators,
                ischemia: self.ischemia,
                spo2: self.spo2,
            };
            synth.synthesize(time, &ctx, rng)
        })
    }
}

/// Point-in-time summary of the engine, cheap to log or ship to a UI.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModelSnapshot {
    /// Time of the most recent tick (or of construction/reset).
    pub time: Millis,
    /// Current parameters.
    pub params: Parameters,
    /// Current indicators.
    pub indicators: Indicators,
    /// Onset of the most recent beat.
    pub last_beat_time: Option<Millis>,
    /// When the next beat is due.
    pub next_beat_time: Option<Millis>,
    /// Current RR interval (ms).
    pub rr_interval: Millis,
    /// Unrounded filtered SpO2.
    pub spo2: Percent,
    /// SpO2 the filter is approaching.
    pub spo2_target: Percent,
    /// Filtered contractility.
    pub contractility: Percent,
    /// Contractility the filter is approaching.
    pub contractility_target: Percent,
    /// Baroreflex is currently raising heart rate.
    pub baroreflex_compensating: bool,
    /// Beats fired since the last reset.
    pub beats: u64,
}

impl PhysiologyModel<Random> {
    /// Creates an engine at rest, with history ending at `now`.
    ///
    /// The random source is seeded from `config.seed`, or from entropy when
    /// no seed is given.
    pub fn new(config: SimulationConfig, now: Millis) -> Result<Self> {
        let rng = config.seed.map_or_else(Random::from_entropy, Random::new);
        Self::with_random(config, rng, now)
    }
}

impl<R: RandomSource> PhysiologyModel<R> {
    /// Creates an engine with an explicit random source.
    pub fn with_random(config: SimulationConfig, rng: R, now: Millis) -> Result<Self> {
        config.validate()?;
        check_timestamp(now)?;

        Ok(Self {
            synthesizers: Synthesizers::new(&config),
            baroreflex: Baroreflex::new(config.baroreflex.clone()),
            state: EngineState::baseline(&config, now),
            config,
            rng,
        })
    }

    /// Merges a partial parameter update.
    ///
    /// Validation is all-or-nothing: on error the parameters are unchanged.
    /// A heart-rate change re-times the pending beat, a rhythm change resets
    /// rhythm state, and FiO2, contractility or ischemia changes move the
    /// tracking-filter targets.
    #[allow(clippy::float_cmp)]
    pub fn update_params(&mut self, update: ParamUpdate) -> Result<()> {
        let next = match update.merged_into(&self.state.params) {
            Ok(next) => next,
            Err(err) => {
                warn!(error = %err, "rejected parameter update");
                return Err(err);
            }
        };
        debug!(?update, "merging parameter update");

        let state = &mut self.state;
        let previous = mem::replace(&mut state.params, next);
        let params = &state.params;

        if params.arrhythmia != previous.arrhythmia {
            state.scheduler.switch_rhythm(params, &mut self.rng);
        } else if params.heart_rate != previous.heart_rate {
            state.scheduler.retime(params.heart_rate);
        }

        if params.fio2 != previous.fio2 {
            state.spo2.set_target(spo2_target(params.fio2));
        }

        if params.ischemia != previous.ischemia || params.contractility != previous.contractility {
            state
                .contractility
                .set_target(contractility_target(params.contractility, params.ischemia));
        }

        Ok(())
    }

    /// Applies a named clinical preset.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<()> {
        debug!(%preset, "applying preset");
        self.update_params(preset.update())
    }

    /// Restores the resting state and refills every window with flat
    /// history ending at `now`. The random stream continues.
    pub fn reset(&mut self, now: Millis) -> Result<()> {
        check_timestamp(now)?;
        self.state = EngineState::baseline(&self.config, now);
        debug!(time = now, "engine reset");
        Ok(())
    }

    /// Advances the simulation to `now`. Returns the beat fired on this tick,
    /// if any.
    ///
    /// `now` must be finite and not earlier than the previous tick.
    pub fn tick(&mut self, now: Millis) -> Result<Option<Beat>> {
        check_timestamp(now)?;
        let state = &mut self.state;
        if now < state.last_tick {
            return Err(CardioError::InvalidParameter {
                name: "now",
                message: format!(
                    "Tick at {now} ms precedes previous tick at {} ms",
                    state.last_tick
                ),
            });
        }

        let dt = if state.ticks == 0 {
            self.config.filters.nominal_tick_ms
        } else {
            now - state.last_tick
        };
        state.last_tick = now;
        state.ticks += 1;

        let beat = state.scheduler.advance(now, &state.params, &mut self.rng);

        state.spo2.step(dt);
        state.contractility.step(dt);

        state.indicators = compute_indicators(
            &state.params,
            state.contractility.current(),
            state.spo2.current(),
            &self.config.calibration,
        );

        self.refill_buffers(now);

        if self.state.params.baroreflex_enabled {
            self.run_baroreflex();
        } else {
            self.state.compensating = false;
        }

        Ok(beat)
    }

    fn refill_buffers(&mut self, now: Millis) {
        let synth = &self.synthesizers;
        let rng = &mut self.rng;
        let state = &mut self.state;

        let frame = Frame {
            scheduler: &state.scheduler,
            indicators: &state.indicators,
            ischemia: state.params.ischemia,
            spo2: state.spo2.current(),
        };

        frame.fill(&mut state.ecg, &synth.ecg, now, rng);
        frame.fill(&mut state.pressure, &synth.pressure, now, rng);
        frame.fill(&mut state.spo2_trace, &synth.spo2, now, rng);
        frame.fill(&mut state.pcg, &synth.pcg, now, rng);
    }

    fn run_baroreflex(&mut self) {
        let state = &mut self.state;
        let mean_bp = f64::from(state.indicators.mean_bp);

        if let Some(heart_rate) = self.baroreflex.adjust(state.params.heart_rate, mean_bp) {
            if !state.compensating {
                info!(
                    mean_bp,
                    threshold = self.baroreflex.threshold(),
                    heart_rate = state.params.heart_rate,
                    "baroreflex compensating for hypotension"
                );
            }
            state.compensating = true;
            state.params.heart_rate = heart_rate;
        } else {
            if state.compensating {
                debug!(mean_bp, heart_rate = state.params.heart_rate, "baroreflex settled");
            }
            state.compensating = false;
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &Parameters {
        &self.state.params
    }

    /// Indicators as of the last tick.
    pub fn indicators(&self) -> &Indicators {
        &self.state.indicators
    }

    /// Copy of the ECG window, oldest first.
    pub fn ecg_buffer(&self) -> Vec<EcgPoint> {
        self.state.ecg.to_vec()
    }

    /// Copy of the arterial pressure window.
    pub fn pressure_buffer(&self) -> Vec<PressurePoint> {
        self.state.pressure.to_vec()
    }

    /// Copy of the SpO2 window.
    pub fn spo2_buffer(&self) -> Vec<Spo2Point> {
        self.state.spo2_trace.to_vec()
    }

    /// Copy of the phonocardiogram window.
    pub fn pcg_buffer(&self) -> Vec<PcgPoint> {
        self.state.pcg.to_vec()
    }

    /// ECG window without copying.
    pub fn ecg_window(&self) -> &WindowedBuffer<EcgPoint> {
        &self.state.ecg
    }

    /// Pressure window without copying.
    pub fn pressure_window(&self) -> &WindowedBuffer<PressurePoint> {
        &self.state.pressure
    }

    /// SpO2 window without copying.
    pub fn spo2_window(&self) -> &WindowedBuffer<Spo2Point> {
        &self.state.spo2_trace
    }

    /// Phonocardiogram window without copying.
    pub fn pcg_window(&self) -> &WindowedBuffer<PcgPoint> {
        &self.state.pcg
    }

    /// Onset of the most recent beat; `None` before the first beat.
    pub fn last_beat_time(&self) -> Option<Millis> {
        self.state.scheduler.last_beat_time()
    }

    /// When the next beat is due; `None` means on the next tick.
    pub fn next_beat_time(&self) -> Option<Millis> {
        self.state.scheduler.next_beat_time()
    }

    /// Start of the current beat's systole.
    pub fn systole_start_time(&self) -> Option<Millis> {
        self.state.scheduler.systole_start_time()
    }

    /// Start of the current beat's diastole.
    pub fn diastole_start_time(&self) -> Option<Millis> {
        self.state.scheduler.diastole_start_time()
    }

    /// Current RR interval (ms).
    pub fn rr_interval(&self) -> Millis {
        self.state.scheduler.rr_interval()
    }

    /// Most recent beat.
    pub fn current_beat(&self) -> Option<&Beat> {
        self.state.scheduler.current_beat()
    }

    /// Beat scheduler, for inspecting rhythm state.
    pub fn scheduler(&self) -> &BeatScheduler {
        &self.state.scheduler
    }

    /// SpO2 the tracking filter is approaching.
    pub fn spo2_target(&self) -> Percent {
        self.state.spo2.target()
    }

    /// Contractility the tracking filter is approaching.
    pub fn contractility_target(&self) -> Percent {
        self.state.contractility.target()
    }

    /// Unrounded filtered SpO2.
    pub fn current_spo2(&self) -> Percent {
        self.state.spo2.current()
    }

    /// Filtered contractility.
    pub fn current_contractility(&self) -> Percent {
        self.state.contractility.current()
    }

    /// True while the baroreflex is raising heart rate.
    pub fn baroreflex_compensating(&self) -> bool {
        self.state.compensating
    }

    /// Engine configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Random source.
    pub fn random(&self) -> &R {
        &self.rng
    }

    /// Point-in-time summary.
    pub fn snapshot(&self) -> ModelSnapshot {
        let state = &self.state;
        ModelSnapshot {
            time: state.last_tick,
            params: state.params.clone(),
            indicators: state.indicators.clone(),
            last_beat_time: self.last_beat_time(),
            next_beat_time: self.next_beat_time(),
            rr_interval: self.rr_interval(),
            spo2: state.spo2.current(),
            spo2_target: state.spo2.target(),
            contractility: state.contractility.current(),
            contractility_target: state.contractility.target(),
            baroreflex_compensating: state.compensating,
            beats: state.scheduler.beat_count(),
        }
    }
}

#[cfg_attr(not(feature = "serde"), allow(dead_code))]
#[allow(clippy::float_cmp)]
fn check_layout(
    name: &'static str,
    period: Millis,
    window: Millis,
    expected_period: Millis,
    expected_window: Millis,
) -> Result<()> {
    if period == expected_period && window == expected_window {
        return Ok(());
    }
    Err(CardioError::InvalidParameter {
        name,
        message: format!(
            "Period {period} ms and window {window} ms do not match the configured \
             {expected_period} ms and {expected_window} ms"
        ),
    })
}

fn check_timestamp(now: Millis) -> Result<()> {
    if now.is_finite() {
        Ok(())
    } else {
        Err(CardioError::InvalidParameter {
            name: "now",
            message: format!("Timestamp must be finite, got {now}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::RhythmState;
    use crate::types::Arrhythmia;

    fn model() -> PhysiologyModel {
        PhysiologyModel::with_random(SimulationConfig::default(), Random::new(42), 0.0).unwrap()
    }

    fn run(model: &mut PhysiologyModel, from: Millis, to: Millis, step: Millis) {
        let mut t = from;
        while t <= to {
            model.tick(t).unwrap();
            t += step;
        }
    }

    fn set(model: &mut PhysiologyModel, update: ParamUpdate) {
        model.update_params(update).unwrap();
    }

    #[test]
    fn test_new_starts_at_rest() {
        let model = model();
        assert_eq!(model.indicators(), &Indicators::baseline());
        assert_eq!(model.params(), &Parameters::default());
        assert_eq!(model.last_beat_time(), None);
        assert_eq!(model.next_beat_time(), None);

        assert_eq!(model.ecg_buffer().len(), 1500);
        assert_eq!(model.pressure_buffer().len(), 1500);
        assert_eq!(model.spo2_buffer().len(), 150);
        assert_eq!(model.pcg_buffer().len(), 1500);
        assert!(model.pressure_buffer().iter().all(|p| p.pressure == 80.0));
        assert!(model.spo2_buffer().iter().all(|p| p.spo2 == 98.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SimulationConfig::default();
        config.buffers.waveform_period_ms = 0.0;
        assert!(PhysiologyModel::new(config, 0.0).is_err());
    }

    #[test]
    fn test_first_tick_fires_beat() {
        let mut model = model();
        let beat = model.tick(10.0).unwrap().unwrap();
        assert_eq!(beat.start, 10.0);
        assert_eq!(model.last_beat_time(), Some(10.0));
        let rr = 60_000.0 / 70.0;
        assert!((model.next_beat_time().unwrap() - (10.0 + rr)).abs() < 1e-9);
        assert_eq!(model.diastole_start_time(), Some(310.0));
        assert!(model.tick(20.0).unwrap().is_none());
    }

    #[test]
    fn test_bad_timestamps_rejected() {
        let mut model = model();
        model.tick(100.0).unwrap();
        assert!(model.tick(f64::NAN).is_err());
        assert!(model.tick(f64::INFINITY).is_err());
        assert!(matches!(
            model.tick(50.0),
            Err(CardioError::InvalidParameter { name: "now", .. })
        ));
        // Same timestamp is allowed.
        assert!(model.tick(100.0).is_ok());
    }

    #[test]
    fn test_rejected_update_leaves_params() {
        let mut model = model();
        let before = model.params().clone();
        let err = model
            .update_params(ParamUpdate {
                heart_rate: Some(0.0),
                contractility: Some(50.0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CardioError::InvalidParameter { name: "heart_rate", .. }));
        assert_eq!(model.params(), &before);
        assert_eq!(model.contractility_target(), 100.0);
    }

    #[test]
    fn test_heart_rate_change_retimes_next_beat() {
        let mut model = model();
        model.tick(0.0).unwrap();
        set(
            &mut model,
            ParamUpdate {
                heart_rate: Some(60.0),
                ..Default::default()
            },
        );
        assert_eq!(model.next_beat_time(), Some(1000.0));
        assert_eq!(model.rr_interval(), 1000.0);
    }

    #[test]
    fn test_rhythm_change_resets_state() {
        let mut model = model();
        set(
            &mut model,
            ParamUpdate {
                arrhythmia: Some(Arrhythmia::Bigeminy),
                ..Default::default()
            },
        );
        model.tick(0.0).unwrap();
        assert!(matches!(
            model.scheduler().state(),
            RhythmState::Bigeminy { premature_next: true }
        ));

        set(
            &mut model,
            ParamUpdate {
                arrhythmia: Some(Arrhythmia::AvBlock3),
                ..Default::default()
            },
        );
        assert_eq!(model.scheduler().state(), &RhythmState::AvBlock3);
        assert_eq!(model.rr_interval(), 1500.0);
        assert_eq!(model.indicators().rhythm, Arrhythmia::Normal.label());

        model.tick(10.0).unwrap();
        assert_eq!(model.indicators().rhythm, Arrhythmia::AvBlock3.label());
    }

    #[test]
    fn test_hypoxia_and_ischemia_targets() {
        let mut model = model();
        set(
            &mut model,
            ParamUpdate {
                fio2: Some(14.0),
                ischemia: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(model.spo2_target(), 80.0);
        assert!((model.contractility_target() - 70.0).abs() < 1e-9);

        let mut previous_spo2 = model.current_spo2();
        let mut previous_contractility = model.current_contractility();
        run(&mut model, 0.0, 20_000.0, 10.0);
        assert!(model.current_spo2() <= previous_spo2);
        assert!(model.current_spo2() >= 80.0);
        assert!(model.current_contractility() <= previous_contractility);
        assert!(model.current_contractility() >= 70.0);

        previous_spo2 = model.current_spo2();
        previous_contractility = model.current_contractility();
        assert!((previous_spo2 - 80.0).abs() < 0.5);
        assert!((previous_contractility - 70.0).abs() < 0.1);
        assert_eq!(model.indicators().spo2, 80);
    }

    #[test]
    fn test_contractility_floor_under_ischemia() {
        let mut model = model();
        set(
            &mut model,
            ParamUpdate {
                contractility: Some(35.0),
                ischemia: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(model.contractility_target(), 30.0);
    }

    #[test]
    fn test_filters_independent_of_tick_size() {
        let mut fine = model();
        let mut coarse = model();
        for m in [&mut fine, &mut coarse] {
            set(
                m,
                ParamUpdate {
                    fio2: Some(14.0),
                    ..Default::default()
                },
            );
        }
        run(&mut fine, 0.0, 1_000.0, 10.0);
        run(&mut coarse, 0.0, 1_000.0, 50.0);
        assert!((fine.current_spo2() - coarse.current_spo2()).abs() < 0.5);
    }

    #[test]
    fn test_baroreflex_raises_heart_rate_when_hypotensive() {
        let mut model = model();
        model.apply_preset(Preset::Hypovolemia).unwrap();

        let mut previous = model.params().heart_rate;
        for step in 0..200 {
            model.tick(f64::from(step) * 10.0).unwrap();
            let hr = model.params().heart_rate;
            assert!(hr >= previous);
            assert!(hr - previous <= 0.1 + 1e-9);
            previous = hr;
        }
        assert!(model.params().heart_rate > 90.0);
        assert!(model.baroreflex_compensating());
    }

    #[test]
    fn test_disabled_baroreflex_leaves_heart_rate() {
        let mut model = model();
        model.apply_preset(Preset::Hypovolemia).unwrap();
        set(
            &mut model,
            ParamUpdate {
                baroreflex_enabled: Some(false),
                ..Default::default()
            },
        );
        run(&mut model, 0.0, 5_000.0, 10.0);
        assert_eq!(model.params().heart_rate, 90.0);
        assert!(!model.baroreflex_compensating());
    }

    #[test]
    fn test_normotensive_baroreflex_idle() {
        let mut model = model();
        run(&mut model, 0.0, 3_000.0, 10.0);
        assert_eq!(model.params().heart_rate, 70.0);
        let ind = model.indicators();
        assert!((ind.cardiac_output - 4.9).abs() < 1e-9);
        assert_eq!((ind.systolic_bp, ind.diastolic_bp, ind.mean_bp), (120, 80, 93));
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut model = model();
        model.apply_preset(Preset::Hypoxia).unwrap();
        run(&mut model, 0.0, 4_000.0, 10.0);
        assert_ne!(model.indicators(), &Indicators::baseline());

        model.reset(10_000.0).unwrap();
        assert_eq!(model.indicators(), &Indicators::baseline());
        assert_eq!(model.params(), &Parameters::default());
        assert_eq!(model.last_beat_time(), None);
        assert_eq!(model.spo2_target(), 98.0);
        assert_eq!(model.contractility_target(), 100.0);

        let ecg = model.ecg_buffer();
        assert_eq!(ecg.len(), 1500);
        assert_eq!(ecg[0].time, -5_000.0);
        assert!(ecg.iter().all(|p| p.voltage == 0.0));

        let beat = model.tick(10_000.0).unwrap().unwrap();
        assert_eq!(beat.start, 10_000.0);
    }

    #[test]
    fn test_state_validation() {
        let mut model = model();
        run(&mut model, 0.0, 2_000.0, 10.0);
        assert!(model.state.validate(&model.config).is_ok());

        let mut bad_rate = model.state.clone();
        bad_rate.params.heart_rate = 0.0;
        assert!(matches!(
            bad_rate.validate(&model.config),
            Err(CardioError::InvalidParameter { name: "heart_rate", .. })
        ));

        let other = SimulationConfig {
            buffers: crate::config::BufferConfig {
                waveform_period_ms: 5.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            model.state.validate(&other),
            Err(CardioError::InvalidParameter { name: "ecg_buffer", .. })
        ));

        let mut stale_clock = model.state.clone();
        stale_clock.last_tick = f64::NAN;
        assert!(stale_clock.validate(&model.config).is_err());
    }

    #[test]
    fn test_oximetry_jitter_from_config() {
        let config = SimulationConfig {
            oximetry: crate::config::OximetryConfig { jitter: 0.0 },
            ..Default::default()
        };
        let mut model = PhysiologyModel::with_random(config, Random::new(4), 0.0).unwrap();
        run(&mut model, 0.0, 1_000.0, 10.0);
        assert!(model.spo2_window().iter().all(|p| p.spo2 == 98.0));
    }

    #[test]
    fn test_buffers_dense_and_bounded() {
        let mut model = model();
        for t in [7.0, 13.0, 250.0, 251.0, 1_999.0, 2_000.0, 9_000.0, 30_000.0] {
            model.tick(t).unwrap();

            let ecg = model.ecg_buffer();
            assert!(ecg.first().unwrap().time >= t - 15_000.0);
            assert!(ecg.last().unwrap().time <= t);
            for pair in ecg.windows(2) {
                assert!((pair[1].time - pair[0].time - 10.0).abs() < 1e-6);
            }

            let spo2 = model.spo2_buffer();
            for pair in spo2.windows(2) {
                assert!((pair[1].time - pair[0].time - 100.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_ecg_shows_beat() {
        let mut model = model();
        run(&mut model, 0.0, 1_000.0, 10.0);
        let ecg = model.ecg_buffer();
        assert!(ecg.iter().any(|p| p.qrs_complex && p.voltage > 0.9));
        assert!(ecg.iter().any(|p| p.p_wave));
        assert!(ecg.iter().any(|p| p.t_wave));

        let pressure = model.pressure_buffer();
        assert!(pressure.iter().any(|p| p.is_systolic));
        let peak = pressure.iter().map(|p| p.pressure).fold(0.0, f64::max);
        assert!((peak - 120.0).abs() < 1e-6);

        let pcg = model.pcg_buffer();
        assert!(pcg.iter().any(|p| p.s1));
        assert!(pcg.iter().any(|p| p.s2));
    }

    #[test]
    fn test_complete_block_interval() {
        let mut model = model();
        set(
            &mut model,
            ParamUpdate {
                arrhythmia: Some(Arrhythmia::AvBlock3),
                ..Default::default()
            },
        );
        let mut starts = Vec::new();
        let mut t = 0.0;
        while t <= 10_000.0 {
            if let Some(beat) = model.tick(t).unwrap() {
                assert_eq!(beat.rr_interval, 1500.0);
                starts.push(beat.start);
            }
            t += 10.0;
        }
        assert_eq!(starts.len(), 7);
        assert!(model.ecg_buffer().iter().all(|p| !p.p_wave));
    }

    #[test]
    fn test_snapshot_mirrors_accessors() {
        let mut model = model();
        run(&mut model, 0.0, 2_000.0, 10.0);
        let snap = model.snapshot();
        assert_eq!(snap.time, 2_000.0);
        assert_eq!(snap.params, *model.params());
        assert_eq!(snap.indicators, *model.indicators());
        assert_eq!(snap.last_beat_time, model.last_beat_time());
        assert_eq!(snap.beats, 3);
    }

    #[test]
    fn test_seeded_models_agree() {
        let mut a = model();
        let mut b = model();
        for m in [&mut a, &mut b] {
            set(
                m,
                ParamUpdate {
                    arrhythmia: Some(Arrhythmia::AtrialFibrillation),
                    ..Default::default()
                },
            );
            run(m, 0.0, 5_000.0, 10.0);
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.spo2_buffer(), b.spo2_buffer());
    }
}
