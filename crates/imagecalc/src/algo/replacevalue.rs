use crate::{PixelCalculator, Result, check_input_band_count};

/// Copies the band values of every pixel, replacing occurrences of a search value.
/// A NaN search value matches NaN band values.
#[derive(Debug, Clone)]
pub struct ReplaceValue {
    band_count: usize,
    search_value: f64,
    new_value: f64,
}

impl ReplaceValue {
    pub fn new(band_count: usize, search_value: f64, new_value: f64) -> Self {
        ReplaceValue {
            band_count,
            search_value,
            new_value,
        }
    }

    fn matches(&self, value: f64) -> bool {
        value == self.search_value || (value.is_nan() && self.search_value.is_nan())
    }
}

impl PixelCalculator for ReplaceValue {
    fn output_band_count(&self) -> usize {
        self.band_count
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        check_input_band_count(self.band_count, band_count)
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()> {
        for (out, &val) in output.iter_mut().zip(bands) {
            *out = if self.matches(val) { self.new_value } else { val };
        }

        Ok(())
    }
}
