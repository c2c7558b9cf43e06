use crate::{EdgePadding, Error, Matrix, Result, Window, WindowCalculator, check_input_band_count};

/// Number of output bands of [`WindowMahalanobis`]: mean, median, minimum and maximum distance
pub const MAHALANOBIS_OUTPUT_BANDS: usize = 4;

/// Mahalanobis distance of every pixel in the window to a mean vector: `sqrt((v - m)ᵗ C⁻¹ (v - m))`.
///
/// Outputs the mean, median, minimum and maximum of the distances in the window.
/// Windows at the raster edge use [`EdgePadding::Replicate`], the nearest pixels inside the raster count again.
#[derive(Debug, Clone)]
pub struct WindowMahalanobis {
    mean: Vec<f64>,
    inverse_covariance: Matrix,
    pixel: Vec<f64>,
    distances: Vec<f64>,
}

impl WindowMahalanobis {
    pub fn new(mean: Vec<f64>, inverse_covariance: Matrix) -> Result<Self> {
        if inverse_covariance.rows() != mean.len() || inverse_covariance.cols() != mean.len() {
            return Err(Error::InvalidArgument(format!(
                "Inverse covariance matrix of {}x{} does not match the mean vector length {}",
                inverse_covariance.rows(),
                inverse_covariance.cols(),
                mean.len()
            )));
        }

        Ok(WindowMahalanobis {
            pixel: vec![0.0; mean.len()],
            mean,
            inverse_covariance,
            distances: Vec::new(),
        })
    }

    /// Inverts the covariance matrix
    pub fn from_covariance(mean: Vec<f64>, covariance: &Matrix) -> Result<Self> {
        Self::new(mean, covariance.inverse()?)
    }

    fn distance(&mut self) -> f64 {
        for (v, m) in self.pixel.iter_mut().zip(&self.mean) {
            *v -= m;
        }

        self.inverse_covariance.bilinear_form(&self.pixel).max(0.0).sqrt()
    }
}

impl WindowCalculator for WindowMahalanobis {
    fn output_band_count(&self) -> usize {
        MAHALANOBIS_OUTPUT_BANDS
    }

    fn edge_padding(&self) -> EdgePadding {
        EdgePadding::Replicate
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        check_input_band_count(self.mean.len(), band_count)
    }

    fn window(&mut self, window: &Window<'_>, output: &mut [f64]) -> Result<()> {
        check_input_band_count(self.mean.len(), window.band_count())?;
        self.distances.clear();
        for win_row in 0..window.size() {
            for win_col in 0..window.size() {
                window.pixel(win_row, win_col, &mut self.pixel);
                let dist = self.distance();
                self.distances.push(dist);
            }
        }

        self.distances.sort_by(f64::total_cmp);
        let n = self.distances.len();
        let median = if n % 2 == 0 {
            (self.distances[n / 2 - 1] + self.distances[n / 2]) / 2.0
        } else {
            self.distances[n / 2]
        };

        output[0] = self.distances.iter().sum::<f64>() / n as f64;
        output[1] = median;
        output[2] = self.distances[0];
        output[3] = self.distances[n - 1];
        Ok(())
    }
}
