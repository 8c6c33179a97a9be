//! Remnant models.
//!
//! The evaluator only depends on the [`RemnantModel`] trait; the crate ships
//! closed-form fits for each named [`crate::domain::Fits`] variant.

pub mod phenom;
pub mod registry;
pub mod remnant;

pub use phenom::*;
pub use remnant::*;
