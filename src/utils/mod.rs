//! Utility modules for the physiology engine.
//!
//! Currently this holds the injectable random sources.

mod random;

pub use random::{Random, RandomSource, ScriptedSource};
