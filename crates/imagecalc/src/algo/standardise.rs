use crate::{Error, PixelCalculator, Result, check_input_band_count};

/// Standardises every band: `(value - mean) / stddev`.
/// Bands with a zero standard deviation produce 0.
#[derive(Debug, Clone)]
pub struct Standardise {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl Standardise {
    pub fn new(means: Vec<f64>, stddevs: Vec<f64>) -> Result<Self> {
        if means.len() != stddevs.len() {
            return Err(Error::InvalidArgument(format!(
                "Mean count ({}) does not match standard deviation count ({})",
                means.len(),
                stddevs.len()
            )));
        }

        for (band, _) in stddevs.iter().enumerate().filter(|(_, std)| **std == 0.0) {
            log::warn!("Standard deviation of band {} is zero, the standardised values will be 0", band + 1);
        }

        Ok(Standardise { means, stddevs })
    }
}

impl PixelCalculator for Standardise {
    fn output_band_count(&self) -> usize {
        self.means.len()
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        check_input_band_count(self.means.len(), band_count)
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()> {
        for (i, out) in output.iter_mut().enumerate() {
            *out = if self.stddevs[i] == 0.0 {
                0.0
            } else {
                (bands[i] - self.means[i]) / self.stddevs[i]
            };
        }

        Ok(())
    }
}
