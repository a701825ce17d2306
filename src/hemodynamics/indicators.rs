//! Indicator calculator.
//!
//! Stroke volume follows a multiplicative model: Frank-Starling preload
//! effect, contractility, an inverse-square-root afterload penalty and a
//! blood-volume effect. Pressures scale from the calibrated baseline.

use std::borrow::Cow;

use crate::config::Calibration;
use crate::types::{round_half_up, Indicators, Parameters, Percent};

/// Frank-Starling exponent on preload.
const PRELOAD_EXPONENT: f64 = 0.8;
/// Exponent of the afterload penalty on stroke volume.
const AFTERLOAD_EXPONENT: f64 = -0.5;
/// Exponent on circulating volume.
const VOLUME_EXPONENT: f64 = 0.9;

/// Computes the full indicator set.
///
/// `contractility` and `spo2` are the filtered (tracked) values, not the
/// configured parameters.
///
/// ```rust
/// use cardiosim::config::Calibration;
/// use cardiosim::hemodynamics::compute_indicators;
/// use cardiosim::types::Parameters;
///
/// let ind = compute_indicators(&Parameters::default(), 100.0, 98.0, &Calibration::default());
/// assert_eq!((ind.systolic_bp, ind.diastolic_bp, ind.mean_bp), (120, 80, 93));
/// ```
#[must_use]
pub fn compute_indicators(
    params: &Parameters,
    contractility: Percent,
    spo2: Percent,
    calibration: &Calibration,
) -> Indicators {
    let stroke_volume = stroke_volume(params, contractility, calibration);
    let cardiac_output = params.heart_rate * stroke_volume / 1000.0;

    let afterload = params.afterload / 100.0;
    let volume = params.blood_volume / 100.0;

    let systolic = round_half_up(
        calibration.base_systolic_bp
            * (cardiac_output / calibration.base_cardiac_output())
            * afterload
            * volume,
    );
    let diastolic = round_half_up(calibration.base_diastolic_bp * afterload * volume);
    let mean = round_half_up((systolic + 2.0 * diastolic) / 3.0);

    Indicators {
        heart_rate: params.heart_rate,
        stroke_volume: to_unsigned(stroke_volume),
        cardiac_output,
        systolic_bp: to_unsigned(systolic),
        diastolic_bp: to_unsigned(diastolic),
        mean_bp: to_unsigned(mean),
        spo2: to_unsigned(round_half_up(spo2)),
        rhythm: Cow::Borrowed(params.arrhythmia.label()),
    }
}

/// Rounded stroke volume (mL).
#[must_use]
pub fn stroke_volume(params: &Parameters, contractility: Percent, calibration: &Calibration) -> f64 {
    let preload_effect = (params.preload / 100.0).powf(PRELOAD_EXPONENT);
    let contractility_effect = contractility / 100.0;
    let afterload_effect = (params.afterload / 100.0).powf(AFTERLOAD_EXPONENT);
    let volume_effect = (params.blood_volume / 100.0).powf(VOLUME_EXPONENT);

    round_half_up(
        calibration.base_stroke_volume
            * preload_effect
            * contractility_effect
            * afterload_effect
            * volume_effect,
    )
}

#[inline]
fn to_unsigned(value: f64) -> u32 {
    // Saturating cast; inputs are already rounded and non-negative.
    value as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Arrhythmia;

    fn compute(params: &Parameters) -> Indicators {
        compute_indicators(params, params.contractility, 98.0, &Calibration::default())
    }

    #[test]
    fn test_baseline_matches_reference() {
        let ind = compute(&Parameters::default());
        assert_eq!(ind.stroke_volume, 70);
        assert!((ind.cardiac_output - 4.9).abs() < 1e-9);
        assert_eq!(ind.systolic_bp, 120);
        assert_eq!(ind.diastolic_bp, 80);
        assert_eq!(ind.mean_bp, 93);
        assert_eq!(ind.spo2, 98);
        assert_eq!(ind, Indicators::baseline());
    }

    #[test]
    fn test_preload_raises_stroke_volume() {
        let low = compute(&Parameters {
            preload: 70.0,
            ..Default::default()
        });
        let high = compute(&Parameters {
            preload: 130.0,
            ..Default::default()
        });
        assert!(low.stroke_volume < 70);
        assert!(high.stroke_volume > 70);
    }

    #[test]
    fn test_afterload_effects() {
        let ind = compute(&Parameters {
            afterload: 150.0,
            ..Default::default()
        });
        // SV = round(70 * 1.5^-0.5) = 57
        assert_eq!(ind.stroke_volume, 57);
        assert_eq!(ind.diastolic_bp, 120);
        assert!(ind.systolic_bp > 120);
    }

    #[test]
    fn test_hypovolemia_drops_pressure() {
        let ind = compute(&Parameters {
            heart_rate: 90.0,
            preload: 70.0,
            blood_volume: 70.0,
            ..Default::default()
        });
        assert_eq!(ind.diastolic_bp, 56);
        assert!(ind.mean_bp < 70);
    }

    #[test]
    fn test_filtered_contractility_used() {
        let params = Parameters::default();
        let ind = compute_indicators(&params, 70.0, 98.0, &Calibration::default());
        assert_eq!(ind.stroke_volume, 49);
    }

    #[test]
    fn test_rhythm_label_follows_variant() {
        let ind = compute(&Parameters {
            arrhythmia: Arrhythmia::AvBlock3,
            ..Default::default()
        });
        assert_eq!(ind.rhythm, Arrhythmia::AvBlock3.label());
        assert!(matches!(ind.rhythm, Cow::Borrowed(_)));
    }
}
