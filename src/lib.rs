//! `archeo` library crate.
//!
//! Infers the progenitor binaries of black holes that may themselves be merger
//! remnants. A *prior* of simulated binaries and their remnants is generated
//! forward; observed remnant masses and spins are then matched against it
//! within a tolerance window to form a *posterior* over progenitors.
//!
//! The binary (`archeo`) is a thin wrapper around this library so core logic
//! is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infer;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod prior;
pub mod report;
