//! Band index utilities.

use crate::{Error, Result};

/// 1-based raster band index.
///
/// The raster band api's use a 1-based index for bands. We use `NonZeroUsize` to
/// make it impossible to represent band index 0.
pub type BandIndex = std::num::NonZeroUsize;

/// Convenience constant for the first band (band 1).
pub const FIRST_BAND: BandIndex = std::num::NonZeroUsize::new(1).unwrap();

/// Create a band index from a 1-based band number.
pub fn band_index(band_nr: usize) -> Result<BandIndex> {
    BandIndex::new(band_nr).ok_or_else(|| Error::InvalidArgument("Band numbers are 1-based, band 0 does not exist".to_string()))
}
