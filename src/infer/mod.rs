//! Backward inference: match observed remnant draws against a prior, and
//! compare candidate priors against the one a posterior came from.

pub mod bayes;
pub mod matcher;
pub mod posterior;

pub use bayes::*;
pub use matcher::*;
pub use posterior::*;
