//! First-order tracking filters for SpO2 and contractility.

use crate::types::{Millis, Percent};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lowest SpO2 the oxygenation model produces.
pub const SPO2_FLOOR: Percent = 70.0;
/// Lowest contractility under ischemia.
pub const ISCHEMIC_CONTRACTILITY_FLOOR: Percent = 30.0;
/// Fraction of configured contractility retained under ischemia.
pub const ISCHEMIC_CONTRACTILITY_FACTOR: f64 = 0.7;

/// Exponential approach of a current value toward a target.
///
/// `current += (target - current) * min(1, dt / response_time)`
///
/// The step fraction is capped at one, so the value moves monotonically toward
/// the target and never overshoots it regardless of tick size.
///
/// ```rust
/// use cardiosim::hemodynamics::TrackingFilter;
///
/// let mut filter = TrackingFilter::new(98.0, 1000.0);
/// filter.set_target(88.0);
/// filter.step(100.0);
/// assert!((filter.current() - 97.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingFilter {
    current: f64,
    target: f64,
    response_time: Millis,
}

impl TrackingFilter {
    /// Creates a filter settled at `value`.
    #[must_use]
    pub fn new(value: f64, response_time: Millis) -> Self {
        Self {
            current: value,
            target: value,
            response_time,
        }
    }

    /// Advances the filter by `dt` milliseconds.
    pub fn step(&mut self, dt: Millis) -> f64 {
        let alpha = (dt / self.response_time).clamp(0.0, 1.0);
        self.current += (self.target - self.current) * alpha;
        self.current
    }

    /// Sets a new target; the current value is untouched.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Current filtered value.
    #[must_use]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Value being approached.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Response time (ms).
    #[must_use]
    pub fn response_time(&self) -> Millis {
        self.response_time
    }
}

/// SpO2 the patient settles at for a given inspired oxygen fraction.
///
/// Simplified dissociation curve: above room air the saturation creeps toward
/// 100, below it falls steeply to a floor of 70.
#[must_use]
pub fn spo2_target(fio2: Percent) -> Percent {
    if fio2 >= 21.0 {
        (95.0 + (fio2 - 21.0) * 0.2).min(100.0)
    } else {
        (SPO2_FLOOR + (fio2 - 10.0) * 2.5).max(SPO2_FLOOR)
    }
}

/// Contractility the myocardium settles at.
#[must_use]
pub fn contractility_target(contractility: Percent, ischemia: bool) -> Percent {
    if ischemia {
        (contractility * ISCHEMIC_CONTRACTILITY_FACTOR).max(ISCHEMIC_CONTRACTILITY_FLOOR)
    } else {
        contractility
    }
}
