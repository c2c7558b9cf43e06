use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid band index {band}, '{dataset}' has {band_count} band(s)")]
    InvalidBand { dataset: String, band: usize, band_count: usize },
    #[error("Row range {first_row}..{end_row} is outside of '{dataset}' ({rows} rows)")]
    RowRange {
        dataset: String,
        first_row: usize,
        end_row: usize,
        rows: usize,
    },
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("{0}")]
    Infra(#[from] inf::Error),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    GdalError(#[from] gdal::errors::GdalError),
}
