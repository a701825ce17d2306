//! Time-stamped samples stored in the waveform buffers.

use crate::types::{Millis, MmHg, Percent};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A sample carrying an absolute timestamp.
pub trait TimedSample: Clone {
    /// Absolute time of the sample (ms).
    fn time(&self) -> Millis;
}

/// One electrocardiogram sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EcgPoint {
    /// Sample time (ms).
    pub time: Millis,
    /// Lead voltage (mV-like units).
    pub voltage: f64,
    /// Inside a P-wave.
    pub p_wave: bool,
    /// Inside a QRS complex.
    pub qrs_complex: bool,
    /// Inside a T-wave.
    pub t_wave: bool,
    /// ST-segment offset; non-zero only inside an ischemic ST segment.
    pub st_segment: f64,
}

/// One arterial pressure sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PressurePoint {
    /// Sample time (ms).
    pub time: Millis,
    /// Instantaneous arterial pressure.
    pub pressure: MmHg,
    /// Sample falls in the systolic phase.
    pub is_systolic: bool,
}

/// One pulse-oximetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spo2Point {
    /// Sample time (ms).
    pub time: Millis,
    /// Oxygen saturation with measurement jitter.
    pub spo2: Percent,
}

/// One phonocardiogram sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PcgPoint {
    /// Sample time (ms).
    pub time: Millis,
    /// Inside the first heart sound.
    pub s1: bool,
    /// Inside the second heart sound.
    pub s2: bool,
    /// Sound envelope amplitude.
    pub amplitude: f64,
}

macro_rules! impl_timed_sample {
    ($($ty:ty),*) => {
        $(
            impl TimedSample for $ty {
                #[inline]
                fn time(&self) -> Millis {
                    self.time
                }
            }
        )*
    };
}

impl_timed_sample!(EcgPoint, PressurePoint, Spo2Point, PcgPoint);
