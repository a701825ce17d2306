//! # cardiosim - cardiac physiology simulation engine
//!
//! A real-time model of cardiac electrophysiology and hemodynamics for
//! training and visualization front-ends. The engine is driven by external
//! timestamps and exposes parameters, derived indicators and four trailing
//! waveform windows that renderers poll after every tick.
//!
//! ## Overview
//!
//! - **Rhythm scheduling**: beat timing under ten rhythm variants, from normal
//!   sinus rhythm through atrial fibrillation and the AV blocks
//! - **Hemodynamics**: stroke volume, cardiac output and arterial pressures
//!   derived from settable parameters
//! - **Feedback loops**: first-order tracking of SpO2 and contractility, and a
//!   baroreflex raising heart rate under hypotension
//! - **Waveforms**: ECG, arterial pressure, SpO2 and phonocardiogram samples
//!   kept in dense 15 s windows
//!
//! ## Quick Start
//!
//! ```rust
//! use cardiosim::prelude::*;
//!
//! let config = SimulationConfig {
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let mut model = PhysiologyModel::new(config, 0.0).unwrap();
//!
//! model.apply_preset(Preset::Hypovolemia).unwrap();
//! for step in 1..=300 {
//!     model.tick(f64::from(step) * 10.0).unwrap();
//! }
//!
//! assert!(model.indicators().mean_bp < 70);
//! assert!(!model.ecg_buffer().is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod buffers;
pub mod config;
pub mod cues;
pub mod hemodynamics;
pub mod model;
pub mod rhythm;
pub mod types;
pub mod utils;
pub mod waveforms;

#[cfg(feature = "serde")]
pub mod serialization;

/// Re-export of commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::buffers::WindowedBuffer;
    pub use crate::config::SimulationConfig;
    pub use crate::cues::{HeartSound, HeartSoundCues};
    pub use crate::model::{ModelSnapshot, PhysiologyModel};
    pub use crate::rhythm::Beat;
    pub use crate::types::{
        Arrhythmia, Bpm, EcgPoint, Indicators, Millis, MmHg, ParamUpdate, Parameters, PcgPoint,
        Percent, Preset, PressurePoint, Spo2Point,
    };
    pub use crate::utils::{Random, RandomSource, ScriptedSource};

    #[cfg(feature = "serde")]
    pub use crate::serialization::{Serializable, SerializableFormat};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library.
pub mod error {
    use thiserror::Error;

    /// Main error type for cardiosim operations.
    #[derive(Error, Debug)]
    pub enum CardioError {
        /// Invalid parameter value.
        #[error("Invalid parameter '{name}': {message}")]
        InvalidParameter {
            /// Name of the invalid parameter.
            name: &'static str,
            /// Description of the error.
            message: String,
        },

        /// Rhythm identifier not recognized.
        #[error("Unknown arrhythmia '{0}'")]
        UnknownArrhythmia(String),

        /// Preset identifier not recognized.
        #[error("Unknown preset '{0}'")]
        UnknownPreset(String),

        /// Serialization error.
        #[cfg(feature = "serde")]
        #[error("Serialization error: {message}")]
        SerializationError {
            /// Description of the serialization error.
            message: String,
        },

        /// I/O error.
        #[error("I/O error: {message}")]
        IoError {
            /// Description of the I/O error.
            message: String,
        },
    }

    /// Result type alias using CardioError.
    pub type Result<T> = std::result::Result<T, CardioError>;
}

pub use error::{CardioError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = CardioError::InvalidParameter {
            name: "heart_rate",
            message: "must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid parameter 'heart_rate': must be positive");
        assert_eq!(
            CardioError::UnknownPreset("shock".into()).to_string(),
            "Unknown preset 'shock'"
        );
    }
}
