use crate::{Accumulator, NodataPolicy, Result, check_input_band_count};

/// Mean value of every band over the pixels that are not skipped by the nodata policy
#[derive(Debug, Clone)]
pub struct MeanVector {
    nodata: NodataPolicy,
    sums: Vec<f64>,
    count: usize,
}

impl MeanVector {
    pub fn new(band_count: usize, nodata: NodataPolicy) -> Self {
        MeanVector {
            nodata,
            sums: vec![0.0; band_count],
            count: 0,
        }
    }

    /// Number of pixels that contributed to the mean
    pub fn sample_count(&self) -> usize {
        self.count
    }
}

impl Accumulator for MeanVector {
    fn result_len(&self) -> usize {
        self.sums.len()
    }

    fn accumulate(&mut self, bands: &[f64]) -> Result<()> {
        check_input_band_count(self.sums.len(), bands.len())?;

        if self.nodata.skips(bands) {
            return Ok(());
        }

        self.sums.iter_mut().zip(bands).for_each(|(sum, val)| *sum += val);
        self.count += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<Vec<f64>> {
        if self.count == 0 {
            log::warn!("No pixels contributed to the mean vector, the mean is set to 0");
            return Ok(vec![0.0; self.sums.len()]);
        }

        Ok(self.sums.iter().map(|sum| sum / self.count as f64).collect())
    }

    fn reset(&mut self) {
        self.sums.iter_mut().for_each(|sum| *sum = 0.0);
        self.count = 0;
    }
}

/// Number of values in the result of [`BandStatistics`] for every band
pub const STATISTICS_PER_BAND: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
struct BandStats {
    min: f64,
    max: f64,
    sum: f64,
    sum_sq: f64,
    count: usize,
}

impl Default for BandStats {
    fn default() -> Self {
        BandStats {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            sum_sq: 0.0,
            count: 0,
        }
    }
}

/// Minimum, maximum, mean and population standard deviation of every band.
///
/// The result contains [`STATISTICS_PER_BAND`] values per band: `[min, max, mean, stddev]`.
/// NaN values are ignored, bands without values report zeros.
#[derive(Debug, Clone)]
pub struct BandStatistics {
    nodata: NodataPolicy,
    bands: Vec<BandStats>,
}

impl BandStatistics {
    pub fn new(band_count: usize, nodata: NodataPolicy) -> Self {
        BandStatistics {
            nodata,
            bands: vec![BandStats::default(); band_count],
        }
    }
}

impl Accumulator for BandStatistics {
    fn result_len(&self) -> usize {
        self.bands.len() * STATISTICS_PER_BAND
    }

    fn accumulate(&mut self, bands: &[f64]) -> Result<()> {
        check_input_band_count(self.bands.len(), bands.len())?;
        if self.nodata.skips(bands) {
            return Ok(());
        }

        for (stats, &val) in self.bands.iter_mut().zip(bands).filter(|(_, val)| !val.is_nan()) {
            stats.min = stats.min.min(val);
            stats.max = stats.max.max(val);
            stats.sum += val;
            stats.sum_sq += val * val;
            stats.count += 1;
        }

        Ok(())
    }

    fn finalize(&self) -> Result<Vec<f64>> {
        let mut result = Vec::with_capacity(self.result_len());
        for (band, stats) in self.bands.iter().enumerate() {
            if stats.count == 0 {
                log::warn!("Band {} has no valid values", band + 1);
                result.extend_from_slice(&[0.0; STATISTICS_PER_BAND]);
                continue;
            }

            let n = stats.count as f64;
            let mean = stats.sum / n;
            let variance = (stats.sum_sq / n - mean * mean).max(0.0);
            result.extend_from_slice(&[stats.min, stats.max, mean, variance.sqrt()]);
        }

        Ok(result)
    }

    fn reset(&mut self) {
        self.bands.iter_mut().for_each(|stats| *stats = BandStats::default());
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::Error;

    #[test_log::test]
    fn mean_vector_skips_nodata() -> Result<()> {
        let mut acc = MeanVector::new(2, NodataPolicy::AllZero);
        for pixel in [[1.0, 2.0], [0.0, 0.0], [3.0, 4.0]] {
            acc.accumulate(&pixel)?;
        }

        assert_eq!(acc.sample_count(), 2);
        assert_eq!(acc.finalize()?, vec![2.0, 3.0]);

        acc.reset();
        assert_eq!(acc.finalize()?, vec![0.0, 0.0]);
        assert!(acc.accumulate(&[1.0]).is_err());
        Ok(())
    }

    #[test_log::test]
    fn band_statistics() -> Result<()> {
        let mut acc = BandStatistics::new(2, NodataPolicy::None);
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.accumulate(&[value, f64::NAN])?;
        }

        let result = acc.finalize()?;
        assert_eq!(result.len(), 2 * STATISTICS_PER_BAND);
        assert_eq!(&result[..3], &[2.0, 9.0, 5.0]);
        assert_relative_eq!(result[3], 2.0, epsilon = 1e-12);
        assert_eq!(&result[4..], &[0.0; 4]);

        assert!(matches!(
            acc.accumulate(&[1.0, 2.0, 3.0]),
            Err(Error::InputBandMismatch { expected: 2, actual: 3 })
        ));
        Ok(())
    }
}
