use crate::{EdgePadding, Result, Window, WindowCalculator, check_input_band_count};

/// Sample variance of the values in the window, for every band.
///
/// Positions outside of the raster and NaN values are excluded, fewer than two values result in 0.
#[derive(Debug, Clone)]
pub struct LocalVariance {
    band_count: usize,
}

impl LocalVariance {
    pub fn new(band_count: usize) -> Self {
        LocalVariance { band_count }
    }
}

impl WindowCalculator for LocalVariance {
    fn output_band_count(&self) -> usize {
        self.band_count
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        check_input_band_count(self.band_count, band_count)
    }

    fn edge_padding(&self) -> EdgePadding {
        EdgePadding::Constant(f64::NAN)
    }

    fn window(&mut self, window: &Window<'_>, output: &mut [f64]) -> Result<()> {
        for (band, out) in output.iter_mut().enumerate().take(window.band_count()) {
            let (count, sum, sum_sq) = window
                .band(band)
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0usize, 0.0, 0.0), |(n, s, sq), v| (n + 1, s + v, sq + v * v));

            *out = if count < 2 {
                0.0
            } else {
                let n = count as f64;
                ((sum_sq - sum * sum / n) / (n - 1.0)).max(0.0)
            };
        }

        Ok(())
    }
}
