//! Remote sensing raster analysis toolkit.
//!
//! - [`geo`]: raster datasets and drivers
//! - [`imagecalc`]: the block streaming calculation engine and its calculators
//! - [`inf`]: shared infrastructure

pub use geo;
pub use imagecalc;
pub use inf;
