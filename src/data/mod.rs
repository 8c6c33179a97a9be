//! Progenitor sampling and remnant evaluation.

pub mod evaluate;
pub mod mahapatra;
pub mod sample;
pub mod sampler;

pub use evaluate::*;
pub use mahapatra::*;
pub use sample::*;
pub use sampler::*;
