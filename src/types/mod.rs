//! Core types for the physiology engine.
//!
//! This module contains the unit aliases, the user-facing parameter record,
//! the derived indicator set and the sample shapes stored in the waveform
//! buffers.

mod indicators;
mod params;
mod primitives;
mod samples;

pub use indicators::Indicators;
pub use params::{Arrhythmia, ParamUpdate, Parameters, Preset, MAX_HEART_RATE};
pub use primitives::*;
pub use samples::{EcgPoint, PcgPoint, PressurePoint, Spo2Point, TimedSample};
