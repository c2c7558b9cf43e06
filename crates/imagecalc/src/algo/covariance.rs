use geo::{BandIndex, RasterDataset};

use crate::{
    BlockScanner, Error, Matrix, NodataPolicy, PairAccumulator, PixelCalculator, Result, ScanOptions,
    SingleValueAccumulator, algo::statistics::MeanVector, check_input_band_count,
};

/// Adds `(v - m)(v - m)ᵗ` of every pixel to an externally owned matrix.
///
/// Has no output bands, the matrix is its only effect. Pixels skipped by the nodata policy
/// (all bands zero by default) do not contribute.
pub struct CovarianceMatrixBuilder<'m> {
    matrix: &'m mut Matrix,
    means: Vec<f64>,
    nodata: NodataPolicy,
    diff: Vec<f64>,
    count: usize,
}

impl<'m> CovarianceMatrixBuilder<'m> {
    pub fn new(matrix: &'m mut Matrix, means: Vec<f64>) -> Result<Self> {
        if matrix.rows() != means.len() || matrix.cols() != means.len() {
            return Err(Error::InvalidArgument(format!(
                "Covariance matrix of {}x{} does not match the {} band means",
                matrix.rows(),
                matrix.cols(),
                means.len()
            )));
        }

        Ok(CovarianceMatrixBuilder {
            matrix,
            diff: vec![0.0; means.len()],
            means,
            nodata: NodataPolicy::AllZero,
            count: 0,
        })
    }

    pub fn with_nodata(mut self, nodata: NodataPolicy) -> Self {
        self.nodata = nodata;
        self
    }

    /// Number of pixels added to the matrix
    pub fn sample_count(&self) -> usize {
        self.count
    }
}

impl PixelCalculator for CovarianceMatrixBuilder<'_> {
    fn output_band_count(&self) -> usize {
        0
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        check_input_band_count(self.means.len(), band_count)
    }

    fn pixel(&mut self, bands: &[f64], _output: &mut [f64]) -> Result<()> {
        if self.nodata.skips(bands) {
            return Ok(());
        }

        for ((d, val), mean) in self.diff.iter_mut().zip(bands).zip(&self.means) {
            *d = val - mean;
        }

        self.matrix.add_outer_product(&self.diff);
        self.count += 1;
        Ok(())
    }
}

/// Means of the first band of both images of a pixel pair
#[derive(Debug, Default)]
struct PairMeans {
    sum_a: f64,
    sum_b: f64,
    count: usize,
}

impl PairAccumulator for PairMeans {
    fn result_len(&self) -> usize {
        2
    }

    fn accumulate_pair(&mut self, a: &[f64], b: &[f64]) -> Result<()> {
        self.sum_a += a[0];
        self.sum_b += b[0];
        self.count += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<Vec<f64>> {
        if self.count == 0 {
            return Ok(vec![0.0, 0.0]);
        }

        let n = self.count as f64;
        Ok(vec![self.sum_a / n, self.sum_b / n])
    }

    fn reset(&mut self) {
        *self = PairMeans::default();
    }
}

/// Sample covariance between the first band of two images with known means: `Σ(a - meanA)(b - meanB) / (n - 1)`.
/// Fewer than two pixels result in 0.
#[derive(Debug, Clone)]
pub struct ImageCovariance {
    mean_a: f64,
    mean_b: f64,
    sum: f64,
    count: usize,
}

impl ImageCovariance {
    pub fn new(mean_a: f64, mean_b: f64) -> Self {
        ImageCovariance {
            mean_a,
            mean_b,
            sum: 0.0,
            count: 0,
        }
    }
}

impl PairAccumulator for ImageCovariance {
    fn result_len(&self) -> usize {
        1
    }

    fn accumulate_pair(&mut self, a: &[f64], b: &[f64]) -> Result<()> {
        self.sum += (a[0] - self.mean_a) * (b[0] - self.mean_b);
        self.count += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<Vec<f64>> {
        if self.count < 2 {
            log::warn!("Covariance requires at least 2 pixels, got {}: covariance set to 0", self.count);
            return Ok(vec![0.0]);
        }

        Ok(vec![self.sum / (self.count - 1) as f64])
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

/// Pearson correlation coefficient between the first band of two images with known means.
/// A zero variance in either image results in 0.
#[derive(Debug, Clone)]
pub struct ImageCorrelation {
    mean_a: f64,
    mean_b: f64,
    sum_ab: f64,
    sum_aa: f64,
    sum_bb: f64,
}

impl ImageCorrelation {
    pub fn new(mean_a: f64, mean_b: f64) -> Self {
        ImageCorrelation {
            mean_a,
            mean_b,
            sum_ab: 0.0,
            sum_aa: 0.0,
            sum_bb: 0.0,
        }
    }
}

impl PairAccumulator for ImageCorrelation {
    fn result_len(&self) -> usize {
        1
    }

    fn accumulate_pair(&mut self, a: &[f64], b: &[f64]) -> Result<()> {
        let da = a[0] - self.mean_a;
        let db = b[0] - self.mean_b;
        self.sum_ab += da * db;
        self.sum_aa += da * da;
        self.sum_bb += db * db;
        Ok(())
    }

    fn finalize(&self) -> Result<Vec<f64>> {
        if self.sum_aa == 0.0 || self.sum_bb == 0.0 {
            log::warn!("Image variance is zero: correlation set to 0");
            return Ok(vec![0.0]);
        }

        Ok(vec![self.sum_ab / (self.sum_aa * self.sum_bb).sqrt()])
    }

    fn reset(&mut self) {
        self.sum_ab = 0.0;
        self.sum_aa = 0.0;
        self.sum_bb = 0.0;
    }
}

/// Root mean square error between the first band of two images. No pixels result in 0.
#[derive(Debug, Clone, Default)]
pub struct ImageRmse {
    sum_sq: f64,
    count: usize,
}

impl ImageRmse {
    pub fn new() -> Self {
        ImageRmse::default()
    }
}

impl PairAccumulator for ImageRmse {
    fn result_len(&self) -> usize {
        1
    }

    fn accumulate_pair(&mut self, a: &[f64], b: &[f64]) -> Result<()> {
        let diff = a[0] - b[0];
        self.sum_sq += diff * diff;
        self.count += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<Vec<f64>> {
        if self.count == 0 {
            log::warn!("No pixels to calculate the RMSE: RMSE set to 0");
            return Ok(vec![0.0]);
        }

        Ok(vec![(self.sum_sq / self.count as f64).sqrt()])
    }

    fn reset(&mut self) {
        *self = ImageRmse::default();
    }
}

fn single_value(values: Vec<f64>) -> Result<f64> {
    values
        .first()
        .copied()
        .ok_or(Error::OutputBandMismatch { expected: 1, actual: 0 })
}

/// Mean of every band of the concatenated inputs
pub fn mean_vector(inputs: &[&dyn RasterDataset], nodata: NodataPolicy, options: ScanOptions) -> Result<Vec<f64>> {
    let scanner = SingleValueAccumulator::new(inputs, options)?;
    let band_count = inputs.iter().map(|ds| ds.band_count()).sum();
    scanner.accumulate(&mut MeanVector::new(band_count, nodata))
}

/// Sample covariance matrix of the concatenated bands of the inputs.
/// Runs a mean vector pass followed by a covariance matrix pass.
pub fn covariance_matrix(inputs: &[&dyn RasterDataset], nodata: NodataPolicy, options: ScanOptions) -> Result<Matrix> {
    let means = mean_vector(inputs, nodata, options.clone())?;
    let mut matrix = Matrix::zeros(means.len(), means.len());

    let mut builder = CovarianceMatrixBuilder::new(&mut matrix, means)?.with_nodata(nodata);
    BlockScanner::new(inputs, options)?.scan(&mut builder, None)?;

    let count = builder.sample_count();
    if count < 2 {
        log::warn!("Covariance matrix requires at least 2 pixels, got {count}: matrix set to 0");
        return Ok(Matrix::zeros(matrix.rows(), matrix.cols()));
    }

    matrix.scale(1.0 / (count - 1) as f64);
    Ok(matrix)
}

/// Sample covariance between a band of `a` and a band of `b`, the means are calculated in a first pass
pub fn image_covariance(
    a: &dyn RasterDataset,
    band_a: BandIndex,
    b: &dyn RasterDataset,
    band_b: BandIndex,
    options: ScanOptions,
) -> Result<f64> {
    let scanner = SingleValueAccumulator::pairwise(a, band_a, b, band_b, options)?;
    let means = scanner.accumulate_pairs(&mut PairMeans::default())?;
    single_value(scanner.accumulate_pairs(&mut ImageCovariance::new(means[0], means[1]))?)
}

/// Correlation coefficient between a band of `a` and a band of `b`, the means are calculated in a first pass
pub fn image_correlation(
    a: &dyn RasterDataset,
    band_a: BandIndex,
    b: &dyn RasterDataset,
    band_b: BandIndex,
    options: ScanOptions,
) -> Result<f64> {
    let scanner = SingleValueAccumulator::pairwise(a, band_a, b, band_b, options)?;
    let means = scanner.accumulate_pairs(&mut PairMeans::default())?;
    single_value(scanner.accumulate_pairs(&mut ImageCorrelation::new(means[0], means[1]))?)
}

/// Root mean square error between a band of `a` and a band of `b`
pub fn image_rmse(a: &dyn RasterDataset, band_a: BandIndex, b: &dyn RasterDataset, band_b: BandIndex, options: ScanOptions) -> Result<f64> {
    let scanner = SingleValueAccumulator::pairwise(a, band_a, b, band_b, options)?;
    single_value(scanner.accumulate_pairs(&mut ImageRmse::new())?)
}
