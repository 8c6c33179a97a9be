//! Mathematical utilities: spherical coordinates and sample statistics.

pub mod spherical;
pub mod stats;

pub use spherical::*;
pub use stats::*;
