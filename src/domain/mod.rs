//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parameter intervals and model/component enums (`Domain`, `Fits`, `Component`)
//! - the validated prior configuration (`PriorConfig`)
//! - named presets (`Preset`)

pub mod config;
pub mod preset;
pub mod types;

pub use config::*;
pub use preset::*;
pub use types::*;
