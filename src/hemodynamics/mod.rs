//! Hemodynamic model.
//!
//! - **Indicators**: stroke volume, cardiac output and arterial pressures
//!   derived from the current parameters
//! - **Tracking filters**: first-order approach of SpO2 and contractility to
//!   their parameter-driven targets
//! - **Baroreflex**: closed-loop heart-rate compensation for hypotension

mod baroreflex;
mod filters;
mod indicators;

pub use baroreflex::Baroreflex;
pub use filters::{
    contractility_target, spo2_target, TrackingFilter, ISCHEMIC_CONTRACTILITY_FACTOR,
    ISCHEMIC_CONTRACTILITY_FLOOR, SPO2_FLOOR,
};
pub use indicators::{compute_indicators, stroke_volume};
