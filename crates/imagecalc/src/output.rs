use std::path::{Path, PathBuf};

use bon::bon;
use geo::{ArrayDataType, RasterDataset, RasterDriver, RasterGrid, band_index};

use crate::{Error, Result};

/// Describes the raster that receives the output bands of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    path: PathBuf,
    format: String,
    data_type: ArrayDataType,
    band_names: Vec<String>,
}

#[bon]
impl OutputSpec {
    /// * `format` - driver format name (e.g. `GTiff`, `MEM`)
    /// * `data_type` - pixel type of the output bands, `Float32` when absent
    /// * `band_names` - optional names of the output bands, one per output band
    #[builder]
    pub fn new(
        #[builder(into)] path: PathBuf,
        #[builder(into)] format: String,
        data_type: Option<ArrayDataType>,
        band_names: Option<Vec<String>>,
    ) -> Self {
        OutputSpec {
            path,
            format,
            data_type: data_type.unwrap_or(ArrayDataType::Float32),
            band_names: band_names.unwrap_or_default(),
        }
    }

    /// `Float64` output in the memory format
    pub fn in_memory(name: &str) -> Self {
        OutputSpec::builder().path(name).format("MEM").data_type(ArrayDataType::Float64).build()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn data_type(&self) -> ArrayDataType {
        self.data_type
    }

    pub fn band_names(&self) -> &[String] {
        &self.band_names
    }
}

/// Output specification together with the driver that creates the output raster
pub struct Output<'d> {
    pub spec: OutputSpec,
    pub driver: &'d dyn RasterDriver,
}

impl<'d> Output<'d> {
    pub fn new(spec: OutputSpec, driver: &'d dyn RasterDriver) -> Self {
        Output { spec, driver }
    }
}

/// Creates the output raster for a calculator that produces `band_count` values per pixel.
/// Nothing is created for calculators without output bands.
pub(crate) fn create_output(output: Option<Output<'_>>, grid: &RasterGrid, band_count: usize) -> Result<Option<Box<dyn RasterDataset>>> {
    if band_count == 0 {
        if let Some(output) = &output {
            log::debug!("Calculator has no output bands, '{}' is not created", output.spec.path.display());
        }

        return Ok(None);
    }

    let Some(output) = output else {
        return Err(Error::OutputBandMismatch {
            expected: band_count,
            actual: 0,
        });
    };

    let spec = &output.spec;
    if !spec.band_names.is_empty() && spec.band_names.len() != band_count {
        return Err(Error::BandNameCount {
            names: spec.band_names.len(),
            bands: band_count,
        });
    }

    let mut ds = output
        .driver
        .create(&spec.path, &spec.format, grid, band_count, spec.data_type)
        .map_err(|source| Error::CreateOutput {
            path: spec.path.clone(),
            source,
        })?;

    for (index, name) in spec.band_names.iter().enumerate() {
        let band = index + 1;
        ds.set_band_name(band_index(band)?, name).map_err(|source| Error::Write {
            dataset: spec.path.to_string_lossy().to_string(),
            band,
            row: 0,
            source,
        })?;
    }

    log::info!(
        "Created {} output '{}' with {band_count} {} band(s)",
        spec.format,
        spec.path.display(),
        spec.data_type
    );

    Ok(Some(ds))
}

#[cfg(test)]
mod tests {
    use geo::{FIRST_BAND, MemDriver, RasterSize};

    use super::*;

    #[test]
    fn band_names_are_checked_before_creation() {
        let driver = MemDriver::new();
        let grid = RasterGrid::with_size(RasterSize::with_rows_cols(2, 2));
        let spec = OutputSpec::builder()
            .path("out")
            .format("MEM")
            .band_names(vec!["a".to_string()])
            .build();

        let res = create_output(Some(Output::new(spec, &driver)), &grid, 2);
        assert!(matches!(res, Err(Error::BandNameCount { names: 1, bands: 2 })));
        assert_eq!(driver.created_count(), 0);
    }

    #[test]
    fn output_band_names() -> Result<()> {
        let driver = MemDriver::new();
        let grid = RasterGrid::with_size(RasterSize::with_rows_cols(2, 2));
        let spec = OutputSpec::builder()
            .path("out")
            .format("MEM")
            .band_names(vec!["mean".to_string(), "max".to_string()])
            .build();
        assert_eq!(spec.data_type(), ArrayDataType::Float32);

        let ds = create_output(Some(Output::new(spec, &driver)), &grid, 2)?.expect("output raster");
        assert_eq!(ds.band_count(), 2);
        assert_eq!(ds.band_name(FIRST_BAND)?.as_deref(), Some("mean"));
        Ok(())
    }

    #[test]
    fn no_output_bands() -> Result<()> {
        let driver = MemDriver::new();
        let grid = RasterGrid::with_size(RasterSize::with_rows_cols(2, 2));

        assert!(create_output(Some(Output::new(OutputSpec::in_memory("out"), &driver)), &grid, 0)?.is_none());
        assert!(create_output(None, &grid, 0)?.is_none());
        assert_eq!(driver.created_count(), 0);

        assert!(matches!(
            create_output(None, &grid, 3),
            Err(Error::OutputBandMismatch { expected: 3, actual: 0 })
        ));
        Ok(())
    }
}
