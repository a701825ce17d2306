//! Derived hemodynamic indicators.

use std::borrow::Cow;

use crate::types::{Arrhythmia, Bpm};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hemodynamic indicators derived from the current parameters.
///
/// Recomputed every tick; consumers only ever see copies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Indicators {
    /// Heart rate (bpm).
    pub heart_rate: Bpm,
    /// Stroke volume (mL).
    pub stroke_volume: u32,
    /// Cardiac output (L/min).
    pub cardiac_output: f64,
    /// Systolic arterial pressure (mmHg).
    pub systolic_bp: u32,
    /// Diastolic arterial pressure (mmHg).
    pub diastolic_bp: u32,
    /// Mean arterial pressure (mmHg).
    pub mean_bp: u32,
    /// Peripheral oxygen saturation (%).
    pub spo2: u32,
    /// Human-readable rhythm name. Borrowed from the rhythm table except
    /// after deserialization.
    pub rhythm: Cow<'static, str>,
}

impl Indicators {
    /// The resting adult indicator set the engine starts from.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            heart_rate: 70.0,
            stroke_volume: 70,
            cardiac_output: 4.9,
            systolic_bp: 120,
            diastolic_bp: 80,
            mean_bp: 93,
            spo2: 98,
            rhythm: Cow::Borrowed(Arrhythmia::Normal.label()),
        }
    }
}

impl Default for Indicators {
    fn default() -> Self {
        Self::baseline()
    }
}
