//! Baroreflex control of heart rate.

use crate::config::BaroreflexConfig;
use crate::types::{Bpm, MmHg};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raises heart rate when mean arterial pressure falls below threshold.
///
/// One-directional: the controller never lowers heart rate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Baroreflex {
    config: BaroreflexConfig,
}

impl Baroreflex {
    /// Creates a controller.
    #[must_use]
    pub fn new(config: BaroreflexConfig) -> Self {
        Self { config }
    }

    /// Heart rate the reflex is driving toward for a given mean pressure, or
    /// `None` when pressure is at or above threshold.
    #[must_use]
    pub fn target(&self, heart_rate: Bpm, mean_bp: MmHg) -> Option<Bpm> {
        if mean_bp >= self.config.threshold {
            return None;
        }
        let deficit = self.config.threshold - mean_bp;
        Some((heart_rate + deficit * self.config.gain).min(self.config.ceiling_bpm))
    }

    /// One tick of the reflex. Returns the adjusted heart rate, or `None` if
    /// heart rate should stay as it is.
    #[must_use]
    pub fn adjust(&self, heart_rate: Bpm, mean_bp: MmHg) -> Option<Bpm> {
        let target = self.target(heart_rate, mean_bp)?;
        if target > heart_rate {
            Some(target.min(heart_rate + self.config.step_bpm))
        } else {
            None
        }
    }

    /// Pressure below which the reflex engages.
    #[must_use]
    pub fn threshold(&self) -> MmHg {
        self.config.threshold
    }
}

impl Default for Baroreflex {
    fn default() -> Self {
        Self::new(BaroreflexConfig::default())
    }
}
