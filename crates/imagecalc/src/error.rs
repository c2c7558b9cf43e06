use std::path::PathBuf;

use thiserror::Error;

use crate::CalculatorKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No input rasters provided")]
    NoInputs,
    #[error("Raster '{dataset}' with grid {actual} is not aligned with '{reference}' with grid {expected}")]
    GridMismatch {
        reference: String,
        expected: String,
        dataset: String,
        actual: String,
    },
    #[error("Band {band} requested from '{dataset}' which has {band_count} band(s)")]
    BandOutOfRange { dataset: String, band: usize, band_count: usize },
    #[error("Invalid window size {0}, the window size must be odd and at least 1")]
    InvalidWindowSize(usize),
    #[error("Invalid band binding: {0}")]
    InvalidBinding(String),
    #[error("{names} band name(s) provided for {bands} output band(s)")]
    BandNameCount { names: usize, bands: usize },
    #[error("The calculator produces {expected} value(s) per pixel but the output has {actual} band(s)")]
    OutputBandMismatch { expected: usize, actual: usize },
    #[error("The calculator works on {expected} band(s) per pixel but {actual} band(s) are provided")]
    InputBandMismatch { expected: usize, actual: usize },
    #[error("The {operation} is not supported by a {calculator} calculator")]
    UnsupportedOperation { calculator: CalculatorKind, operation: &'static str },
    #[error("Failed to read band {band} row {row} of '{dataset}': {source}")]
    Read {
        dataset: String,
        band: usize,
        row: usize,
        source: geo::Error,
    },
    #[error("Failed to write band {band} row {row} of '{dataset}': {source}")]
    Write {
        dataset: String,
        band: usize,
        row: usize,
        source: geo::Error,
    },
    #[error("Failed to create output raster '{}': {source}", path.display())]
    CreateOutput { path: PathBuf, source: geo::Error },
    #[error("Pass {pass} failed: {source}")]
    Pass { pass: usize, source: Box<Error> },
    #[error("No convergence after {0} passes")]
    NoConvergence(usize),
    #[error("Invalid expression: {0}")]
    Expression(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Raster(#[from] geo::Error),
}
