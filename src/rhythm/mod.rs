//! Rhythm generation.
//!
//! - **Rhythm state**: the active arrhythmia variant with its variant-local
//!   control state and interval rule
//! - **Beat scheduler**: the beat timeline driven by the external clock

mod scheduler;
mod state;

pub use scheduler::{Beat, BeatScheduler};
pub use state::{
    BeatPlan, RhythmState, RrScaling, AF_RR_SPREAD, AV_BLOCK_2_DROP_PROBABILITY,
    ESCAPE_RATE_BPM, FLUTTER_ATRIAL_RATE_BPM, PVC_LONG_COUPLING_PROBABILITY,
    PVC_SINUS_PROBABILITY,
};
