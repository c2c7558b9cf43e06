use bon::bon;

use crate::{Error, NodataPolicy, PixelCalculator, Result};

/// Collects band vectors of the image as samples for clustering.
///
/// Every `stride`-th pixel that is not skipped by the nodata policy is kept, until the optional maximum is reached.
#[derive(Debug, Clone)]
pub struct SampleExtractor {
    stride: usize,
    nodata: NodataPolicy,
    max_samples: Option<usize>,
    candidates: usize,
    samples: Vec<Vec<f64>>,
}

#[bon]
impl SampleExtractor {
    /// * `stride` - keep one out of `stride` valid pixels (default 1: every pixel)
    /// * `nodata` - pixels to skip (default: none)
    /// * `max_samples` - stop collecting after this number of samples
    #[builder]
    pub fn new(stride: Option<usize>, nodata: Option<NodataPolicy>, max_samples: Option<usize>) -> Result<Self> {
        let stride = stride.unwrap_or(1);
        if stride == 0 {
            return Err(Error::InvalidArgument("Sample stride must be at least 1".to_string()));
        }

        Ok(SampleExtractor {
            stride,
            nodata: nodata.unwrap_or_default(),
            max_samples,
            candidates: 0,
            samples: Vec::new(),
        })
    }

    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Vec<f64>> {
        self.samples
    }

    fn is_full(&self) -> bool {
        self.max_samples.is_some_and(|max| self.samples.len() >= max)
    }
}

impl PixelCalculator for SampleExtractor {
    fn output_band_count(&self) -> usize {
        0
    }

    fn pixel(&mut self, bands: &[f64], _output: &mut [f64]) -> Result<()> {
        if self.is_full() || self.nodata.skips(bands) {
            return Ok(());
        }

        if self.candidates % self.stride == 0 {
            self.samples.push(bands.to_vec());
        }

        self.candidates += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use geo::{MemRaster, RasterGrid, RasterSize};

    use super::*;
    use crate::{BlockScanner, ScanOptions};

    #[test_log::test]
    fn every_second_valid_pixel() -> Result<()> {
        let grid = RasterGrid::with_size(RasterSize::with_rows_cols(2, 4));
        let ds = MemRaster::from_bands("ds", grid, vec![vec![1.0, 0.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0]])?;

        let mut extractor = SampleExtractor::builder().stride(2).nodata(NodataPolicy::AllZero).build()?;
        let out = BlockScanner::new(&[&ds], ScanOptions::builder().block_rows(1).build())?.scan(&mut extractor, None)?;
        assert!(out.is_none());
        assert_eq!(extractor.into_samples(), vec![vec![1.0], vec![3.0], vec![5.0]]);
        Ok(())
    }

    #[test]
    fn sample_limit() -> Result<()> {
        let mut extractor = SampleExtractor::builder().max_samples(2).build()?;
        let mut no_output: [f64; 0] = [];
        for v in 0..5 {
            extractor.pixel(&[f64::from(v)], &mut no_output)?;
        }

        assert_eq!(extractor.samples(), &[vec![0.0], vec![1.0]]);
        assert!(SampleExtractor::builder().stride(0).build().is_err());
        Ok(())
    }
}
