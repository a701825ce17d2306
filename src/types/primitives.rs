//! Primitive type definitions for the physiology engine.
//!
//! All times are absolute milliseconds on the caller's clock. Physiological
//! quantities are carried as `f64` and named by unit so signatures read as
//! what they measure.

/// Absolute timestamp in milliseconds, as supplied by the external clock.
pub type Millis = f64;

/// Heart rate in beats per minute.
pub type Bpm = f64;

/// Percentage of a physiological baseline (100 = normal).
pub type Percent = f64;

/// Pressure in millimetres of mercury.
pub type MmHg = f64;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: Millis = 60_000.0;

/// Rounds to the nearest integer, with halves rounded toward positive infinity.
#[inline]
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Converts a heart rate into the RR interval it implies.
#[inline]
#[must_use]
pub fn rr_from_bpm(bpm: Bpm) -> Millis {
    MS_PER_MINUTE / bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(92.5), 93.0);
        assert_eq!(round_half_up(93.333), 93.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(4.49), 4.0);
    }

    #[test]
    fn test_rr_from_bpm() {
        assert!((rr_from_bpm(60.0) - 1000.0).abs() < 1e-9);
        assert!((rr_from_bpm(40.0) - 1500.0).abs() < 1e-9);
    }
}
