//! In-memory raster datasets, used for intermediate results and in tests.

use std::{cell::Cell, path::Path};

use crate::{ArrayDataType, BandIndex, Error, RasterDataset, RasterDriver, RasterGrid, Result, dataset::check_row_access};

struct MemBand {
    data_type: ArrayDataType,
    name: Option<String>,
    data: Vec<f64>,
}

/// Raster dataset that keeps all its bands in memory
pub struct MemRaster {
    description: String,
    grid: RasterGrid,
    bands: Vec<MemBand>,
}

impl MemRaster {
    /// Creates a zero-filled raster
    pub fn new(description: impl Into<String>, grid: RasterGrid, band_count: usize, data_type: ArrayDataType) -> Self {
        let cell_count = grid.size().cell_count();
        MemRaster {
            description: description.into(),
            grid,
            bands: (0..band_count)
                .map(|_| MemBand {
                    data_type,
                    name: None,
                    data: vec![0.0; cell_count],
                })
                .collect(),
        }
    }

    /// Creates a `Float64` raster from the provided band data (row-major, one vec per band)
    pub fn from_bands(description: impl Into<String>, grid: RasterGrid, bands: Vec<Vec<f64>>) -> Result<Self> {
        let description = description.into();
        let cell_count = grid.size().cell_count();
        if let Some(band) = bands.iter().find(|band| band.len() != cell_count) {
            return Err(Error::InvalidArgument(format!(
                "Band data of '{description}' has {} values, the grid {} requires {cell_count}",
                band.len(),
                grid.size()
            )));
        }

        Ok(MemRaster {
            description,
            grid,
            bands: bands
                .into_iter()
                .map(|data| MemBand {
                    data_type: ArrayDataType::Float64,
                    name: None,
                    data,
                })
                .collect(),
        })
    }

    /// Direct access to the values of a band
    pub fn band_data(&self, band: BandIndex) -> Result<&[f64]> {
        Ok(&self.band(band)?.data)
    }

    fn band(&self, band: BandIndex) -> Result<&MemBand> {
        self.bands.get(band.get() - 1).ok_or_else(|| self.invalid_band(band))
    }

    fn band_mut(&mut self, band: BandIndex) -> Result<&mut MemBand> {
        let err = self.invalid_band(band);
        self.bands.get_mut(band.get() - 1).ok_or(err)
    }

    fn invalid_band(&self, band: BandIndex) -> Error {
        Error::InvalidBand {
            dataset: self.description.clone(),
            band: band.get(),
            band_count: self.bands.len(),
        }
    }
}

impl RasterDataset for MemRaster {
    fn description(&self) -> &str {
        &self.description
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    fn data_type(&self, band: BandIndex) -> Result<ArrayDataType> {
        Ok(self.band(band)?.data_type)
    }

    fn band_name(&self, band: BandIndex) -> Result<Option<String>> {
        Ok(self.band(band)?.name.clone())
    }

    fn set_band_name(&mut self, band: BandIndex, name: &str) -> Result<()> {
        self.band_mut(band)?.name = Some(name.to_string());
        Ok(())
    }

    fn read_rows(&self, band: BandIndex, first_row: usize, dst: &mut [f64]) -> Result<()> {
        check_row_access(self, band, first_row, dst.len())?;
        let offset = first_row * self.grid.cols();
        dst.copy_from_slice(&self.band(band)?.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_rows(&mut self, band: BandIndex, first_row: usize, src: &[f64]) -> Result<()> {
        check_row_access(&*self, band, first_row, src.len())?;
        let offset = first_row * self.grid.cols();
        let band = self.band_mut(band)?;
        let data_type = band.data_type;
        for (dst, &value) in band.data[offset..offset + src.len()].iter_mut().zip(src) {
            *dst = data_type.storage_value(value);
        }

        Ok(())
    }
}

/// Driver that creates [`MemRaster`] datasets, only the `MEM` format is supported.
/// Keeps track of the number of created datasets.
#[derive(Default)]
pub struct MemDriver {
    created: Cell<usize>,
}

impl MemDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.get()
    }
}

impl RasterDriver for MemDriver {
    fn create(
        &self,
        path: &Path,
        format: &str,
        grid: &RasterGrid,
        band_count: usize,
        data_type: ArrayDataType,
    ) -> Result<Box<dyn RasterDataset>> {
        if !format.eq_ignore_ascii_case("MEM") {
            return Err(Error::InvalidArgument(format!(
                "The memory driver does not support the '{format}' format"
            )));
        }

        self.created.set(self.created.get() + 1);
        Ok(Box::new(MemRaster::new(
            path.to_string_lossy(),
            grid.clone(),
            band_count,
            data_type,
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::{FIRST_BAND, RasterSize, band_index};

    use super::*;

    fn grid() -> RasterGrid {
        RasterGrid::with_size(RasterSize::with_rows_cols(3, 2))
    }

    #[test]
    fn read_write_rows() -> Result<()> {
        let mut ras = MemRaster::new("test", grid(), 2, ArrayDataType::Uint8);
        let band2 = band_index(2)?;

        ras.write_rows(band2, 1, &[1.4, 2.6, 300.0, -5.0])?;
        assert_eq!(ras.band_data(band2)?, &[0.0, 0.0, 1.0, 3.0, 255.0, 0.0]);
        assert_eq!(ras.band_data(FIRST_BAND)?, &[0.0; 6]);

        let mut row = [0.0; 2];
        ras.read_rows(band2, 2, &mut row)?;
        assert_eq!(row, [255.0, 0.0]);

        Ok(())
    }

    #[test]
    fn invalid_access() -> Result<()> {
        let mut ras = MemRaster::from_bands("test", grid(), vec![vec![1.0; 6]])?;

        assert!(matches!(
            ras.read_rows(band_index(2)?, 0, &mut [0.0; 2]),
            Err(Error::InvalidBand { band: 2, band_count: 1, .. })
        ));
        assert!(matches!(
            ras.write_rows(FIRST_BAND, 2, &[0.0; 4]),
            Err(Error::RowRange { first_row: 2, end_row: 4, .. })
        ));
        assert!(ras.read_rows(FIRST_BAND, 0, &mut [0.0; 3]).is_err());
        assert!(MemRaster::from_bands("test", grid(), vec![vec![1.0; 5]]).is_err());

        Ok(())
    }

    #[test]
    fn band_names() -> Result<()> {
        let mut ras = MemRaster::new("test", grid(), 1, ArrayDataType::Float32);
        assert_eq!(ras.band_name(FIRST_BAND)?, None);
        ras.set_band_name(FIRST_BAND, "ndvi")?;
        assert_eq!(ras.band_name(FIRST_BAND)?.as_deref(), Some("ndvi"));
        Ok(())
    }

    #[test]
    fn driver_counts_created_datasets() -> Result<()> {
        let driver = MemDriver::new();
        assert!(driver.create(Path::new("out.tif"), "GTiff", &grid(), 1, ArrayDataType::Float32).is_err());
        assert_eq!(driver.created_count(), 0);

        let ds = driver.create(Path::new("out"), "mem", &grid(), 3, ArrayDataType::Int16)?;
        assert_eq!(driver.created_count(), 1);
        assert_eq!(ds.band_count(), 3);
        assert_eq!(ds.data_type(FIRST_BAND)?, ArrayDataType::Int16);
        assert_eq!(ds.description(), "out");

        Ok(())
    }
}
