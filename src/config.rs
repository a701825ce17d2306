//! Engine configuration and calibration constants.
//!
//! Every struct's `Default` carries the reference calibration. The values are
//! empirical curve-fitting constants; they are kept as-is rather than derived.
//!
//! # Example
//!
//! ```rust
//! use cardiosim::config::{BufferConfig, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     buffers: BufferConfig {
//!         window_ms: 5_000.0,
//!         ..Default::default()
//!     },
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{CardioError, Result};
use crate::types::{Bpm, Millis, MmHg, Percent};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Resting baseline of the virtual patient.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Calibration {
    /// Heart rate at which `base_stroke_volume` produces baseline output.
    pub base_heart_rate: Bpm,
    /// Stroke volume at 100% preload, contractility, afterload and volume (mL).
    pub base_stroke_volume: f64,
    /// Systolic pressure at baseline cardiac output.
    pub base_systolic_bp: MmHg,
    /// Diastolic pressure at baseline afterload and volume.
    pub base_diastolic_bp: MmHg,
    /// Resting oxygen saturation.
    pub base_spo2: Percent,
    /// Duration of mechanical systole (ms).
    pub systole_duration_ms: Millis,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            base_heart_rate: 70.0,
            base_stroke_volume: 70.0,
            base_systolic_bp: 120.0,
            base_diastolic_bp: 80.0,
            base_spo2: 98.0,
            systole_duration_ms: 300.0,
        }
    }
}

impl Calibration {
    /// Cardiac output at baseline heart rate and stroke volume (L/min).
    #[must_use]
    pub fn base_cardiac_output(&self) -> f64 {
        self.base_heart_rate * self.base_stroke_volume / 1000.0
    }
}

/// ECG segment timing and morphology.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EcgTiming {
    /// P-wave duration (ms).
    pub p_duration_ms: Millis,
    /// Baseline PR interval (ms).
    pub pr_interval_ms: Millis,
    /// PR prolongation factor in first-degree AV block.
    pub av_block_pr_factor: f64,
    /// QRS duration (ms).
    pub qrs_duration_ms: Millis,
    /// QRS widening factor in ventricular tachycardia.
    pub vt_qrs_widening: f64,
    /// QRS amplitude factor in ventricular tachycardia.
    pub vt_qrs_gain: f64,
    /// ST segment duration (ms).
    pub st_duration_ms: Millis,
    /// T-wave duration (ms).
    pub t_duration_ms: Millis,
    /// ST offset under ischemia.
    pub ischemic_st_offset: f64,
    /// Probability that an ischemic beat has an inverted T-wave.
    pub t_inversion_probability: f64,
}

impl Default for EcgTiming {
    fn default() -> Self {
        Self {
            p_duration_ms: 80.0,
            pr_interval_ms: 160.0,
            av_block_pr_factor: 1.5,
            qrs_duration_ms: 80.0,
            vt_qrs_widening: 1.5,
            vt_qrs_gain: 0.8,
            st_duration_ms: 80.0,
            t_duration_ms: 160.0,
            ischemic_st_offset: -0.15,
            t_inversion_probability: 0.3,
        }
    }
}

/// Shape of the arterial pressure curve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PressureShape {
    /// Fraction of systole spent on the upstroke.
    pub upstroke_fraction: f64,
    /// Exponential decay rate across one RR interval of diastole.
    pub diastolic_decay: f64,
}

impl Default for PressureShape {
    fn default() -> Self {
        Self {
            upstroke_fraction: 0.3,
            diastolic_decay: 3.0,
        }
    }
}

/// Heart-sound burst placement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PcgTiming {
    /// S1 onset after the beat (ms).
    pub s1_onset_ms: Millis,
    /// S1 duration (ms).
    pub s1_duration_ms: Millis,
    /// S2 onset after end of systole (ms).
    pub s2_delay_ms: Millis,
    /// S2 duration (ms).
    pub s2_duration_ms: Millis,
    /// S2 amplitude relative to S1.
    pub s2_gain: f64,
}

impl Default for PcgTiming {
    fn default() -> Self {
        Self {
            s1_onset_ms: 20.0,
            s1_duration_ms: 40.0,
            s2_delay_ms: 20.0,
            s2_duration_ms: 30.0,
            s2_gain: 0.8,
        }
    }
}

/// Tracking filter response times.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    /// SpO2 response time (ms).
    pub spo2_response_ms: Millis,
    /// Contractility response time (ms).
    pub contractility_response_ms: Millis,
    /// Step used on the first tick, before an elapsed time is known (ms).
    pub nominal_tick_ms: Millis,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            spo2_response_ms: 5000.0,
            contractility_response_ms: 3000.0,
            nominal_tick_ms: 10.0,
        }
    }
}

/// Pulse-oximetry trace settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OximetryConfig {
    /// Half-width of the uniform measurement jitter (% SpO2).
    pub jitter: Percent,
}

impl Default for OximetryConfig {
    fn default() -> Self {
        Self { jitter: 0.25 }
    }
}

/// Baroreflex controller settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BaroreflexConfig {
    /// Mean pressure below which the reflex engages.
    pub threshold: MmHg,
    /// Heart-rate increase per tick.
    pub step_bpm: Bpm,
    /// Target heart-rate gain per mmHg below threshold.
    pub gain: f64,
    /// Heart-rate ceiling.
    pub ceiling_bpm: Bpm,
}

impl Default for BaroreflexConfig {
    fn default() -> Self {
        Self {
            threshold: 70.0,
            step_bpm: 0.1,
            gain: 2.0,
            ceiling_bpm: 220.0,
        }
    }
}

/// Waveform buffer retention and sampling periods.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BufferConfig {
    /// Trailing window kept in every buffer (ms).
    pub window_ms: Millis,
    /// Sampling period of the ECG, pressure and PCG buffers (ms).
    pub waveform_period_ms: Millis,
    /// Sampling period of the SpO2 buffer (ms).
    pub spo2_period_ms: Millis,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            window_ms: 15_000.0,
            waveform_period_ms: 10.0,
            spo2_period_ms: 100.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// Resting baseline.
    pub calibration: Calibration,
    /// ECG morphology.
    pub ecg: EcgTiming,
    /// Pressure curve shape.
    pub pressure: PressureShape,
    /// Heart-sound placement.
    pub pcg: PcgTiming,
    /// Tracking filters.
    pub filters: FilterConfig,
    /// SpO2 trace jitter.
    pub oximetry: OximetryConfig,
    /// Baroreflex controller.
    pub baroreflex: BaroreflexConfig,
    /// Buffer retention.
    pub buffers: BufferConfig,
    /// Seed for the default random source; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Checks that every duration, rate and period is usable.
    pub fn validate(&self) -> Result<()> {
        let cal = &self.calibration;
        positive("calibration.base_heart_rate", cal.base_heart_rate)?;
        positive("calibration.base_stroke_volume", cal.base_stroke_volume)?;
        positive("calibration.base_systolic_bp", cal.base_systolic_bp)?;
        positive("calibration.base_diastolic_bp", cal.base_diastolic_bp)?;
        positive("calibration.base_spo2", cal.base_spo2)?;
        positive("calibration.systole_duration_ms", cal.systole_duration_ms)?;

        let ecg = &self.ecg;
        positive("ecg.p_duration_ms", ecg.p_duration_ms)?;
        positive("ecg.pr_interval_ms", ecg.pr_interval_ms)?;
        positive("ecg.av_block_pr_factor", ecg.av_block_pr_factor)?;
        positive("ecg.qrs_duration_ms", ecg.qrs_duration_ms)?;
        positive("ecg.vt_qrs_widening", ecg.vt_qrs_widening)?;
        positive("ecg.st_duration_ms", ecg.st_duration_ms)?;
        positive("ecg.t_duration_ms", ecg.t_duration_ms)?;
        probability("ecg.t_inversion_probability", ecg.t_inversion_probability)?;

        fraction("pressure.upstroke_fraction", self.pressure.upstroke_fraction)?;
        positive("pressure.diastolic_decay", self.pressure.diastolic_decay)?;

        positive("pcg.s1_duration_ms", self.pcg.s1_duration_ms)?;
        positive("pcg.s2_duration_ms", self.pcg.s2_duration_ms)?;

        positive("filters.spo2_response_ms", self.filters.spo2_response_ms)?;
        positive(
            "filters.contractility_response_ms",
            self.filters.contractility_response_ms,
        )?;
        positive("filters.nominal_tick_ms", self.filters.nominal_tick_ms)?;

        let jitter = self.oximetry.jitter;
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(CardioError::InvalidParameter {
                name: "oximetry.jitter",
                message: format!("Must be finite and >= 0, got {jitter}"),
            });
        }

        positive("baroreflex.threshold", self.baroreflex.threshold)?;
        positive("baroreflex.step_bpm", self.baroreflex.step_bpm)?;
        positive("baroreflex.ceiling_bpm", self.baroreflex.ceiling_bpm)?;

        let buffers = &self.buffers;
        positive("buffers.waveform_period_ms", buffers.waveform_period_ms)?;
        positive("buffers.spo2_period_ms", buffers.spo2_period_ms)?;
        positive("buffers.window_ms", buffers.window_ms)?;
        if buffers.window_ms < buffers.waveform_period_ms.max(buffers.spo2_period_ms) {
            return Err(CardioError::InvalidParameter {
                name: "buffers.window_ms",
                message: "Must be at least one sampling period".to_string(),
            });
        }

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CardioError::InvalidParameter {
            name,
            message: format!("Must be > 0, got {value}"),
        });
    }
    Ok(())
}

fn fraction(name: &'static str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(CardioError::InvalidParameter {
            name,
            message: format!("Must lie in (0, 1), got {value}"),
        });
    }
    Ok(())
}

fn probability(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CardioError::InvalidParameter {
            name,
            message: format!("Must lie in [0, 1], got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_base_cardiac_output() {
        let cal = Calibration::default();
        assert!((cal.base_cardiac_output() - 4.9).abs() < 1e-12);
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SimulationConfig {
            buffers: BufferConfig {
                waveform_period_ms: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            CardioError::InvalidParameter { name: "buffers.waveform_period_ms", .. }
        ));
    }

    #[test]
    fn test_window_shorter_than_period_rejected() {
        let config = SimulationConfig {
            buffers: BufferConfig {
                window_ms: 50.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_jitter_rejected() {
        let mut config = SimulationConfig::default();
        config.oximetry.jitter = 0.0;
        assert!(config.validate().is_ok());

        config.oximetry.jitter = -0.1;
        assert!(matches!(
            config.validate(),
            Err(CardioError::InvalidParameter { name: "oximetry.jitter", .. })
        ));
    }

    #[test]
    fn test_bad_upstroke_fraction_rejected() {
        let config = SimulationConfig {
            pressure: PressureShape {
                upstroke_fraction: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
