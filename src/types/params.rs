//! User-settable physiological parameters, rhythm variants and presets.

use std::fmt;
use std::str::FromStr;

use crate::error::{CardioError, Result};
use crate::types::{Bpm, Percent};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest heart rate accepted at the parameter boundary.
pub const MAX_HEART_RATE: Bpm = 300.0;

/// Cardiac rhythm variant.
///
/// Each variant owns its own interval rule; see
/// [`RhythmState`](crate::rhythm::RhythmState) for the variant-local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Arrhythmia {
    /// Normal sinus rhythm.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "normal"))]
    Normal,
    /// Atrial fibrillation: irregularly irregular RR, no P-waves.
    #[cfg_attr(feature = "serde", serde(rename = "fa"))]
    AtrialFibrillation,
    /// Atrial flutter with variable AV conduction.
    #[cfg_attr(feature = "serde", serde(rename = "flutter"))]
    AtrialFlutter,
    /// Occasional premature ventricular contractions.
    #[cfg_attr(feature = "serde", serde(rename = "pvcs"))]
    Pvcs,
    /// Ventricular bigeminy: every other beat is premature.
    #[cfg_attr(feature = "serde", serde(rename = "bigeminy"))]
    Bigeminy,
    /// Ventricular tachycardia.
    #[cfg_attr(feature = "serde", serde(rename = "vt"))]
    VentricularTachycardia,
    /// Sinus bradycardia.
    #[cfg_attr(feature = "serde", serde(rename = "sinus-brady"))]
    SinusBradycardia,
    /// First-degree AV block (prolonged PR).
    #[cfg_attr(feature = "serde", serde(rename = "av-block-1"))]
    AvBlock1,
    /// Second-degree AV block (intermittently dropped beats).
    #[cfg_attr(feature = "serde", serde(rename = "av-block-2"))]
    AvBlock2,
    /// Third-degree (complete) AV block with ventricular escape rhythm.
    #[cfg_attr(feature = "serde", serde(rename = "av-block-3"))]
    AvBlock3,
}

impl Arrhythmia {
    /// Every known variant, in menu order.
    pub const ALL: [Arrhythmia; 10] = [
        Arrhythmia::Normal,
        Arrhythmia::AtrialFibrillation,
        Arrhythmia::AtrialFlutter,
        Arrhythmia::Pvcs,
        Arrhythmia::Bigeminy,
        Arrhythmia::VentricularTachycardia,
        Arrhythmia::SinusBradycardia,
        Arrhythmia::AvBlock1,
        Arrhythmia::AvBlock2,
        Arrhythmia::AvBlock3,
    ];

    /// Short machine identifier (`"fa"`, `"av-block-3"`, ...).
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AtrialFibrillation => "fa",
            Self::AtrialFlutter => "flutter",
            Self::Pvcs => "pvcs",
            Self::Bigeminy => "bigeminy",
            Self::VentricularTachycardia => "vt",
            Self::SinusBradycardia => "sinus-brady",
            Self::AvBlock1 => "av-block-1",
            Self::AvBlock2 => "av-block-2",
            Self::AvBlock3 => "av-block-3",
        }
    }

    /// Display label used for the rhythm indicator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal Sinus Rhythm",
            Self::AtrialFibrillation => "Atrial Fibrillation",
            Self::AtrialFlutter => "Atrial Flutter",
            Self::Pvcs => "Premature Ventricular Contractions",
            Self::Bigeminy => "Ventricular Bigeminy",
            Self::VentricularTachycardia => "Ventricular Tachycardia",
            Self::SinusBradycardia => "Sinus Bradycardia",
            Self::AvBlock1 => "1st Degree AV Block",
            Self::AvBlock2 => "2nd Degree AV Block",
            Self::AvBlock3 => "3rd Degree AV Block (Complete)",
        }
    }

    /// Whether beats of this rhythm are preceded by a conducted P-wave.
    #[must_use]
    pub const fn has_p_wave(self) -> bool {
        !matches!(
            self,
            Self::AtrialFibrillation | Self::VentricularTachycardia | Self::AvBlock3
        )
    }
}

impl fmt::Display for Arrhythmia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Arrhythmia {
    type Err = CardioError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|variant| variant.id() == id)
            .ok_or_else(|| CardioError::UnknownArrhythmia(s.to_string()))
    }
}

/// Current physiological parameters of the virtual patient.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameters {
    /// Heart rate (bpm).
    pub heart_rate: Bpm,
    /// Contractility (% of baseline).
    pub contractility: Percent,
    /// Ventricular preload (% of baseline).
    pub preload: Percent,
    /// Afterload (% of baseline).
    pub afterload: Percent,
    /// Fraction of inspired oxygen (%).
    pub fio2: Percent,
    /// Circulating blood volume (% of baseline).
    pub blood_volume: Percent,
    /// Active rhythm.
    pub arrhythmia: Arrhythmia,
    /// Myocardial ischemia present.
    pub ischemia: bool,
    /// Baroreflex control of heart rate enabled.
    pub baroreflex_enabled: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            heart_rate: 70.0,
            contractility: 100.0,
            preload: 100.0,
            afterload: 100.0,
            fio2: 21.0,
            blood_volume: 100.0,
            arrhythmia: Arrhythmia::Normal,
            ischemia: false,
            baroreflex_enabled: true,
        }
    }
}

impl Parameters {
    /// Checks every numeric field against its admissible range.
    pub fn validate(&self) -> Result<()> {
        check_heart_rate(self.heart_rate)?;
        check_percent("contractility", self.contractility)?;
        check_percent("preload", self.preload)?;
        check_percent("afterload", self.afterload)?;
        check_percent("blood_volume", self.blood_volume)?;
        check_percent("fio2", self.fio2)?;
        if self.fio2 > 100.0 {
            return Err(CardioError::InvalidParameter {
                name: "fio2",
                message: format!("Must be <= 100, got {}", self.fio2),
            });
        }
        Ok(())
    }
}

fn check_heart_rate(value: Bpm) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > MAX_HEART_RATE {
        return Err(CardioError::InvalidParameter {
            name: "heart_rate",
            message: format!("Must be in (0, {MAX_HEART_RATE}], got {value}"),
        });
    }
    Ok(())
}

fn check_percent(name: &'static str, value: Percent) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CardioError::InvalidParameter {
            name,
            message: format!("Must be a positive finite percentage, got {value}"),
        });
    }
    Ok(())
}

/// A partial parameter set. `None` fields leave the current value untouched.
///
/// ```rust
/// use cardiosim::types::{Arrhythmia, ParamUpdate, Parameters};
///
/// let update = ParamUpdate {
///     heart_rate: Some(45.0),
///     arrhythmia: Some(Arrhythmia::SinusBradycardia),
///     ..Default::default()
/// };
/// let merged = update.merged_into(&Parameters::default()).unwrap();
/// assert_eq!(merged.heart_rate, 45.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParamUpdate {
    /// New heart rate.
    pub heart_rate: Option<Bpm>,
    /// New contractility.
    pub contractility: Option<Percent>,
    /// New preload.
    pub preload: Option<Percent>,
    /// New afterload.
    pub afterload: Option<Percent>,
    /// New inspired oxygen fraction.
    pub fio2: Option<Percent>,
    /// New blood volume.
    pub blood_volume: Option<Percent>,
    /// New rhythm.
    pub arrhythmia: Option<Arrhythmia>,
    /// New ischemia flag.
    pub ischemia: Option<bool>,
    /// New baroreflex flag.
    pub baroreflex_enabled: Option<bool>,
}

impl ParamUpdate {
    /// Returns `current` with this update applied, or an error if the result
    /// would be invalid. `current` is never modified.
    pub fn merged_into(&self, current: &Parameters) -> Result<Parameters> {
        let merged = Parameters {
            heart_rate: self.heart_rate.unwrap_or(current.heart_rate),
            contractility: self.contractility.unwrap_or(current.contractility),
            preload: self.preload.unwrap_or(current.preload),
            afterload: self.afterload.unwrap_or(current.afterload),
            fio2: self.fio2.unwrap_or(current.fio2),
            blood_volume: self.blood_volume.unwrap_or(current.blood_volume),
            arrhythmia: self.arrhythmia.unwrap_or(current.arrhythmia),
            ischemia: self.ischemia.unwrap_or(current.ischemia),
            baroreflex_enabled: self
                .baroreflex_enabled
                .unwrap_or(current.baroreflex_enabled),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// True if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Named clinical scenarios that set several parameters at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Preset {
    /// Healthy resting adult.
    Normal,
    /// Atrial fibrillation with rapid ventricular response.
    AtrialFibrillation,
    /// Sinus tachycardia at 140 bpm.
    SinusTachycardia,
    /// Sinus bradycardia at 45 bpm.
    SinusBradycardia,
    /// Reduced circulating volume.
    Hypovolemia,
    /// Hypoxic, ischemic patient.
    Hypoxia,
    /// Ventricular tachycardia at 180 bpm.
    VentricularTachycardia,
}

impl Preset {
    /// Every preset, in menu order.
    pub const ALL: [Preset; 7] = [
        Preset::Normal,
        Preset::AtrialFibrillation,
        Preset::SinusTachycardia,
        Preset::SinusBradycardia,
        Preset::Hypovolemia,
        Preset::Hypoxia,
        Preset::VentricularTachycardia,
    ];

    /// Short machine identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AtrialFibrillation => "fa",
            Self::SinusTachycardia => "sinus-tachy",
            Self::SinusBradycardia => "sinus-brady",
            Self::Hypovolemia => "hypovolemia",
            Self::Hypoxia => "hypoxia",
            Self::VentricularTachycardia => "vt",
        }
    }

    /// The full parameter update this preset applies.
    ///
    /// Presets leave the baroreflex flag alone.
    #[must_use]
    pub fn update(self) -> ParamUpdate {
        // (hr, contractility, preload, fio2, volume, rhythm, ischemia)
        let (hr, contractility, preload, fio2, volume, arrhythmia, ischemia) = match self {
            Self::Normal => (70.0, 100.0, 100.0, 21.0, 100.0, Arrhythmia::Normal, false),
            Self::AtrialFibrillation => {
                (120.0, 90.0, 100.0, 21.0, 100.0, Arrhythmia::AtrialFibrillation, false)
            }
            Self::SinusTachycardia => (140.0, 100.0, 100.0, 21.0, 100.0, Arrhythmia::Normal, false),
            Self::SinusBradycardia => {
                (45.0, 100.0, 100.0, 21.0, 100.0, Arrhythmia::SinusBradycardia, false)
            }
            Self::Hypovolemia => (90.0, 100.0, 70.0, 21.0, 70.0, Arrhythmia::Normal, false),
            Self::Hypoxia => (110.0, 100.0, 100.0, 14.0, 100.0, Arrhythmia::Normal, true),
            Self::VentricularTachycardia => {
                (180.0, 70.0, 100.0, 21.0, 100.0, Arrhythmia::VentricularTachycardia, false)
            }
        };

        ParamUpdate {
            heart_rate: Some(hr),
            contractility: Some(contractility),
            preload: Some(preload),
            afterload: Some(100.0),
            fio2: Some(fio2),
            blood_volume: Some(volume),
            arrhythmia: Some(arrhythmia),
            ischemia: Some(ischemia),
            baroreflex_enabled: None,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Preset {
    type Err = CardioError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.id() == id)
            .ok_or_else(|| CardioError::UnknownPreset(s.to_string()))
    }
}
