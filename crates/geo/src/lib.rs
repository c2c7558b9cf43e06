#![warn(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Raster dataset access for the image calculation engine.
//!
//! A [`RasterDataset`] is an opened raster with a pixel grid and a number of bands that can be read and
//! written row by row. New rasters are created through a [`RasterDriver`].
//! An in-memory implementation is always available, the GDAL backed implementation requires the `gdal` feature.

pub type Result<T = ()> = std::result::Result<T, Error>;

mod arraydatatype;
mod bandindex;
mod dataset;
mod error;
#[cfg(feature = "gdal")]
#[cfg_attr(docsrs, doc(cfg(feature = "gdal")))]
pub mod gdalraster;
mod geotransform;
mod grid;
pub mod memory;
mod rastersize;
#[cfg(feature = "gdal")]
mod runtimeconfiguration;

#[doc(inline)]
pub use arraydatatype::ArrayDataType;
pub use bandindex::{BandIndex, FIRST_BAND, band_index};
#[doc(inline)]
pub use dataset::{RasterDataset, RasterDriver, open_raster, open_raster_for_update};
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use geotransform::GeoTransform;
#[doc(inline)]
pub use grid::RasterGrid;
#[doc(inline)]
pub use memory::{MemDriver, MemRaster};
#[doc(inline)]
pub use rastersize::RasterSize;
#[cfg(feature = "gdal")]
pub use runtimeconfiguration::RuntimeConfiguration;

pub type Point<T = f64> = geo_types::Point<T>;
