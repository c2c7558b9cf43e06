use geo::RasterDataset;

use crate::{
    BlockScanner, Error, Matrix, NodataPolicy, Output, PixelCalculator, Result, ScanOptions, algo::covariance, check_input_band_count,
};

/// Projects the band vector of every pixel on eigenvectors: `out[k] = Σ (v[b] - mean[b]) · E[b][k]`.
///
/// The eigenvector matrix has one row per input band and one column per eigenvector.
/// Without means the band values are projected as is.
#[derive(Debug, Clone)]
pub struct ApplyEigenvectors {
    eigenvectors: Matrix,
    means: Option<Vec<f64>>,
    components: usize,
}

impl ApplyEigenvectors {
    pub fn new(eigenvectors: Matrix, components: usize, means: Option<Vec<f64>>) -> Result<Self> {
        if components == 0 || components > eigenvectors.cols() {
            return Err(Error::InvalidArgument(format!(
                "Invalid number of components {components}, {} eigenvector(s) available",
                eigenvectors.cols()
            )));
        }

        if let Some(means) = &means
            && means.len() != eigenvectors.rows()
        {
            return Err(Error::InvalidArgument(format!(
                "Mean count ({}) does not match the eigenvector length ({})",
                means.len(),
                eigenvectors.rows()
            )));
        }

        Ok(ApplyEigenvectors {
            eigenvectors,
            means,
            components,
        })
    }
}

impl PixelCalculator for ApplyEigenvectors {
    fn output_band_count(&self) -> usize {
        self.components
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        check_input_band_count(self.eigenvectors.rows(), band_count)
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()> {
        for (k, out) in output.iter_mut().enumerate() {
            *out = (0..self.eigenvectors.rows())
                .map(|b| {
                    let mean = self.means.as_ref().map_or(0.0, |means| means[b]);
                    (bands[b] - mean) * self.eigenvectors[(b, k)]
                })
                .sum();
        }

        Ok(())
    }
}

/// Result of a principal component analysis
pub struct PrincipalComponents {
    /// Eigenvalues of the band covariance matrix in descending order
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors as columns, in the order of the eigenvalues
    pub eigenvectors: Matrix,
    /// The projected image with one band per component
    pub dataset: Box<dyn RasterDataset>,
}

/// Principal component analysis of the concatenated bands of the inputs.
///
/// Runs three passes over the inputs: the mean vector, the covariance matrix and the projection
/// of every pixel on the first `components` eigenvectors.
pub fn principal_components(
    inputs: &[&dyn RasterDataset],
    components: usize,
    nodata: NodataPolicy,
    output: Output<'_>,
    options: ScanOptions,
) -> Result<PrincipalComponents> {
    let means = covariance::mean_vector(inputs, nodata, options.clone())?;
    let cov = covariance::covariance_matrix(inputs, nodata, options.clone())?;
    let (eigenvalues, eigenvectors) = cov.symmetric_eigen()?;
    log::debug!("PCA eigenvalues: {eigenvalues:?}");

    let mut calc = ApplyEigenvectors::new(eigenvectors.clone(), components, Some(means))?;
    let dataset = BlockScanner::new(inputs, options)?
        .scan(&mut calc, Some(output))?
        .ok_or(Error::OutputBandMismatch {
            expected: components,
            actual: 0,
        })?;

    Ok(PrincipalComponents {
        eigenvalues,
        eigenvectors,
        dataset,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{FIRST_BAND, MemDriver, MemRaster, RasterGrid, RasterSize};

    use super::*;
    use crate::OutputSpec;

    #[test]
    fn projection() -> Result<()> {
        let vectors = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 2.0]])?;
        let mut calc = ApplyEigenvectors::new(vectors.clone(), 2, Some(vec![1.0, 1.0]))?;
        let mut out = [0.0; 2];
        calc.pixel(&[3.0, 4.0], &mut out)?;
        assert_eq!(out, [2.0, 6.0]);

        let mut calc = ApplyEigenvectors::new(vectors.clone(), 1, None)?;
        let mut out = [0.0; 1];
        calc.pixel(&[3.0, 4.0], &mut out)?;
        assert_eq!(out, [3.0]);
        assert!(matches!(
            calc.check_band_count(3),
            Err(Error::InputBandMismatch { expected: 2, actual: 3 })
        ));

        assert!(ApplyEigenvectors::new(vectors.clone(), 3, None).is_err());
        assert!(ApplyEigenvectors::new(vectors, 1, Some(vec![1.0])).is_err());
        Ok(())
    }

    #[test_log::test]
    fn correlated_bands_have_one_component() -> Result<()> {
        // band 2 = 2 * band 1: all variance is in the first component
        let grid = RasterGrid::with_size(RasterSize::with_rows_cols(2, 3));
        let band: Vec<f64> = (1..=6).map(f64::from).collect();
        let ds = MemRaster::from_bands("ds", grid, vec![band.clone(), band.iter().map(|v| v * 2.0).collect()])?;
        let driver = MemDriver::new();

        let pca = principal_components(
            &[&ds],
            1,
            NodataPolicy::None,
            Output::new(OutputSpec::in_memory("pca"), &driver),
            ScanOptions::default(),
        )?;

        assert_relative_eq!(pca.eigenvalues[0], 5.0 * 3.5, epsilon = 1e-9);
        assert_relative_eq!(pca.eigenvalues[1], 0.0, epsilon = 1e-9);
        assert_eq!(pca.dataset.band_count(), 1);

        // the projection is centred and proportional to the band values
        let projected = pca.dataset.read_band(FIRST_BAND)?;
        assert_relative_eq!(projected.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
        assert_relative_eq!((projected[5] - projected[0]).abs(), 5.0 * 5f64.sqrt(), epsilon = 1e-9);
        Ok(())
    }
}
