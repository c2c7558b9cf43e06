use std::path::Path;

use crate::{ArrayDataType, BandIndex, Error, RasterGrid, RasterSize, Result};

/// An opened raster dataset that can be read and written in blocks of complete rows.
///
/// Pixel values are always exchanged as `f64`, implementations convert from and to the band data type.
/// Bands are addressed with a 1-based [`BandIndex`].
/// Buffers passed to [`RasterDataset::read_rows`] and [`RasterDataset::write_rows`] hold complete rows,
/// the number of rows is derived from the buffer length.
pub trait RasterDataset {
    /// Human readable identification of the dataset, used in log and error messages
    fn description(&self) -> &str;
    fn band_count(&self) -> usize;
    fn grid(&self) -> &RasterGrid;
    fn data_type(&self, band: BandIndex) -> Result<ArrayDataType>;
    fn band_name(&self, band: BandIndex) -> Result<Option<String>>;
    fn set_band_name(&mut self, band: BandIndex, name: &str) -> Result<()>;

    /// Reads `dst.len() / cols` rows of the band starting at `first_row`
    fn read_rows(&self, band: BandIndex, first_row: usize, dst: &mut [f64]) -> Result<()>;

    /// Writes `src.len() / cols` rows to the band starting at `first_row`.
    /// Values are rounded and clamped to the band data type.
    fn write_rows(&mut self, band: BandIndex, first_row: usize, src: &[f64]) -> Result<()>;

    /// Makes sure all the written data ends up in the underlying storage
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn raster_size(&self) -> RasterSize {
        self.grid().size()
    }

    /// Reads a complete band
    fn read_band(&self, band: BandIndex) -> Result<Vec<f64>> {
        let mut data = vec![0.0; self.raster_size().cell_count()];
        self.read_rows(band, 0, &mut data)?;
        Ok(data)
    }
}

/// Creates new raster datasets
pub trait RasterDriver {
    /// Creates a dataset on the provided grid with `band_count` bands of the given data type.
    /// The `format` is the name of the driver specific output format (e.g. `GTiff`, `MEM`).
    fn create(
        &self,
        path: &Path,
        format: &str,
        grid: &RasterGrid,
        band_count: usize,
        data_type: ArrayDataType,
    ) -> Result<Box<dyn RasterDataset>>;
}

/// Checks the band exists and the buffer covers complete rows inside the raster.
/// Returns the number of rows the buffer covers.
pub(crate) fn check_row_access(ds: &dyn RasterDataset, band: BandIndex, first_row: usize, buffer_len: usize) -> Result<usize> {
    if band.get() > ds.band_count() {
        return Err(Error::InvalidBand {
            dataset: ds.description().to_string(),
            band: band.get(),
            band_count: ds.band_count(),
        });
    }

    let size = ds.raster_size();
    if size.cols == 0 {
        return Ok(0);
    }

    if buffer_len % size.cols != 0 {
        return Err(Error::InvalidArgument(format!(
            "Buffer of {buffer_len} values does not contain complete rows of {} columns",
            size.cols
        )));
    }

    let rows = buffer_len / size.cols;
    if first_row + rows > size.rows {
        return Err(Error::RowRange {
            dataset: ds.description().to_string(),
            first_row,
            end_row: first_row + rows,
            rows: size.rows,
        });
    }

    Ok(rows)
}

/// Opens an existing raster for reading
pub fn open_raster(path: impl AsRef<Path>) -> Result<Box<dyn RasterDataset>> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "gdal")] {
            Ok(Box::new(crate::gdalraster::GdalDataset::open_read_only(path)?))
        } else {
            Err(Error::Runtime(format!(
                "Raster file support not compiled in, can not open: {}",
                path.as_ref().display()
            )))
        }
    }
}

/// Opens an existing raster for reading and writing
pub fn open_raster_for_update(path: impl AsRef<Path>) -> Result<Box<dyn RasterDataset>> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "gdal")] {
            Ok(Box::new(crate::gdalraster::GdalDataset::open_update(path)?))
        } else {
            Err(Error::Runtime(format!(
                "Raster file support not compiled in, can not open: {}",
                path.as_ref().display()
            )))
        }
    }
}
