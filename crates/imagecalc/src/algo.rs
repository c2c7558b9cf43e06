//! Calculators for common remote sensing operations, driven by the scanners of this crate.

mod bandmaths;
mod covariance;
pub mod distancegrowth;
mod expression;
mod localvariance;
mod mahalanobis;
mod pca;
mod replacevalue;
mod sampling;
mod standardise;
mod statistics;

pub use {bandmaths::BandMaths, expression::Expression, expression::Variable};

pub use {
    covariance::CovarianceMatrixBuilder, covariance::ImageCorrelation, covariance::ImageCovariance, covariance::ImageRmse,
    covariance::covariance_matrix, covariance::image_correlation, covariance::image_covariance, covariance::image_rmse,
    covariance::mean_vector,
};

pub use {
    distancegrowth::DistanceGrowth, distancegrowth::ScaleDepth, distancegrowth::SeedMask, distancegrowth::UNVISITED,
    distancegrowth::distance_transform,
};

pub use {localvariance::LocalVariance, mahalanobis::MAHALANOBIS_OUTPUT_BANDS, mahalanobis::WindowMahalanobis};

pub use {pca::ApplyEigenvectors, pca::PrincipalComponents, pca::principal_components};

pub use {replacevalue::ReplaceValue, sampling::SampleExtractor, standardise::Standardise};

pub use {statistics::BandStatistics, statistics::MeanVector, statistics::STATISTICS_PER_BAND};
