#![cfg_attr(feature = "simd", feature(allocator_api))]
#![warn(clippy::unwrap_used)]

pub use error::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod allocate;
pub mod cast;
mod error;
#[cfg(feature = "gdal")]
pub mod gdalinterop;

#[doc(inline)]
pub use allocate::AlignedVec;
