//! GDAL backed raster datasets

use std::path::{Path, PathBuf};

use gdal::{Metadata as _, errors::GdalError, raster::Buffer};
use inf::gdalinterop::create_output_directory_if_needed;

use crate::{
    ArrayDataType, BandIndex, Error, GeoTransform, RasterDataset, RasterDriver, RasterGrid, RasterSize, Result,
    dataset::check_row_access,
};

/// A raster dataset opened through GDAL
pub struct GdalDataset {
    ds: gdal::Dataset,
    description: String,
    grid: RasterGrid,
}

impl GdalDataset {
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let options = gdal::DatasetOptions {
            open_flags: gdal::GdalOpenFlags::GDAL_OF_READONLY | gdal::GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        };

        Self::from_dataset(open_with_options(path.as_ref(), options)?, path.as_ref().to_string_lossy())
    }

    pub fn open_update(path: impl AsRef<Path>) -> Result<Self> {
        let options = gdal::DatasetOptions {
            open_flags: gdal::GdalOpenFlags::GDAL_OF_UPDATE | gdal::GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        };

        Self::from_dataset(open_with_options(path.as_ref(), options)?, path.as_ref().to_string_lossy())
    }

    pub fn from_dataset(ds: gdal::Dataset, description: impl Into<String>) -> Result<Self> {
        let (cols, rows) = ds.raster_size();
        let grid = RasterGrid::new(
            RasterSize::with_rows_cols(rows, cols),
            GeoTransform::new(ds.geo_transform().unwrap_or(GeoTransform::default().coefficients())),
            ds.projection(),
        );

        Ok(GdalDataset {
            ds,
            description: description.into(),
            grid,
        })
    }

    fn band_rows(
        &self,
        band: BandIndex,
        first_row: usize,
        len: usize,
    ) -> Result<(gdal::raster::RasterBand<'_>, (isize, isize), (usize, usize))> {
        let rows = check_row_access(self, band, first_row, len)?;
        let raster_band = self.ds.rasterband(band.get())?;
        Ok((raster_band, (0, first_row as isize), (self.grid.cols(), rows)))
    }
}

fn open_with_options(path: &Path, options: gdal::DatasetOptions) -> Result<gdal::Dataset> {
    gdal::Dataset::open_ex(path, options).map_err(|err| match err {
        GdalError::NullPointer { method_name: _, msg: _ } if !path.exists() => Error::InvalidPath(PathBuf::from(path)),
        _ => Error::Runtime(format!("Failed to open raster dataset: {} ({})", path.to_string_lossy(), err)),
    })
}

impl RasterDataset for GdalDataset {
    fn description(&self) -> &str {
        &self.description
    }

    fn band_count(&self) -> usize {
        self.ds.raster_count()
    }

    fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    fn data_type(&self, band: BandIndex) -> Result<ArrayDataType> {
        self.ds.rasterband(band.get())?.band_type().try_into()
    }

    fn band_name(&self, band: BandIndex) -> Result<Option<String>> {
        let name = self.ds.rasterband(band.get())?.description()?;
        Ok((!name.is_empty()).then_some(name))
    }

    fn set_band_name(&mut self, band: BandIndex, name: &str) -> Result<()> {
        let mut raster_band = self.ds.rasterband(band.get())?;
        raster_band.set_description(name)?;
        Ok(())
    }

    fn read_rows(&self, band: BandIndex, first_row: usize, dst: &mut [f64]) -> Result<()> {
        let (raster_band, offset, window) = self.band_rows(band, first_row, dst.len())?;
        if window.0 * window.1 > 0 {
            raster_band.read_into_slice::<f64>(offset, window, window, dst, None)?;
        }

        Ok(())
    }

    fn write_rows(&mut self, band: BandIndex, first_row: usize, src: &[f64]) -> Result<()> {
        let data_type = self.data_type(band)?;
        let (mut raster_band, offset, window) = self.band_rows(band, first_row, src.len())?;
        if window.0 * window.1 > 0 {
            let data = src.iter().map(|&v| data_type.storage_value(v)).collect();
            raster_band.write(offset, window, &mut Buffer::new(window, data))?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ds.flush_cache()?;
        Ok(())
    }
}

/// Creates rasters using the GDAL driver with the requested format name
#[derive(Default)]
pub struct GdalDriver;

impl GdalDriver {
    pub fn new() -> Self {
        GdalDriver
    }
}

impl RasterDriver for GdalDriver {
    fn create(
        &self,
        path: &Path,
        format: &str,
        grid: &RasterGrid,
        band_count: usize,
        data_type: ArrayDataType,
    ) -> Result<Box<dyn RasterDataset>> {
        let driver = gdal::DriverManager::get_driver_by_name(format)
            .map_err(|err| Error::Runtime(format!("Gdal driver not supported: {format} ({err})")))?;

        if !format.eq_ignore_ascii_case("MEM") {
            create_output_directory_if_needed(path)?;
        }

        let (cols, rows) = (grid.cols(), grid.rows());
        let mut ds = match data_type {
            ArrayDataType::Int8 => driver.create_with_band_type::<i8, _>(path, cols, rows, band_count)?,
            ArrayDataType::Uint8 => driver.create_with_band_type::<u8, _>(path, cols, rows, band_count)?,
            ArrayDataType::Int16 => driver.create_with_band_type::<i16, _>(path, cols, rows, band_count)?,
            ArrayDataType::Uint16 => driver.create_with_band_type::<u16, _>(path, cols, rows, band_count)?,
            ArrayDataType::Int32 => driver.create_with_band_type::<i32, _>(path, cols, rows, band_count)?,
            ArrayDataType::Uint32 => driver.create_with_band_type::<u32, _>(path, cols, rows, band_count)?,
            ArrayDataType::Int64 => driver.create_with_band_type::<i64, _>(path, cols, rows, band_count)?,
            ArrayDataType::Uint64 => driver.create_with_band_type::<u64, _>(path, cols, rows, band_count)?,
            ArrayDataType::Float32 => driver.create_with_band_type::<f32, _>(path, cols, rows, band_count)?,
            ArrayDataType::Float64 => driver.create_with_band_type::<f64, _>(path, cols, rows, band_count)?,
        };

        ds.set_geo_transform(&grid.geo_transform().coefficients())?;
        if !grid.projection().is_empty() {
            ds.set_projection(grid.projection())?;
        }

        log::debug!("Created {format} raster {} {} with {band_count} {data_type} band(s)", path.display(), grid.size());
        Ok(Box::new(GdalDataset::from_dataset(ds, path.to_string_lossy())?))
    }
}
