use approx::relative_eq;

use crate::{GeoTransform, Point, RasterSize};

/// The pixel grid of a raster: its size, geotransform and projection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterGrid {
    size: RasterSize,
    geo_transform: GeoTransform,
    projection: String,
}

impl RasterGrid {
    pub fn new(size: RasterSize, geo_transform: GeoTransform, projection: impl Into<String>) -> Self {
        RasterGrid {
            size,
            geo_transform,
            projection: projection.into(),
        }
    }

    /// Grid of unit cells with the origin at (0, 0) and no projection
    pub fn with_size(size: RasterSize) -> Self {
        RasterGrid {
            size,
            ..Default::default()
        }
    }

    pub fn size(&self) -> RasterSize {
        self.size
    }

    pub fn rows(&self) -> usize {
        self.size.rows
    }

    pub fn cols(&self) -> usize {
        self.size.cols
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn cell_size_x(&self) -> f64 {
        self.geo_transform.cell_size_x()
    }

    pub fn cell_size_y(&self) -> f64 {
        self.geo_transform.cell_size_y()
    }

    /// The absolute horizontal pixel size
    pub fn resolution(&self) -> f64 {
        self.cell_size_x().abs()
    }

    /// Map coordinate of the centre of the cell
    pub fn cell_centre(&self, row: usize, col: usize) -> Point {
        self.geo_transform.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Two grids are aligned when they have the same size, origin and pixel size.
    /// The projection is not compared, projection strings of the same system differ between drivers.
    pub fn is_aligned_with(&self, other: &RasterGrid) -> bool {
        self.size == other.size && relative_eq!(self.geo_transform, other.geo_transform, epsilon = 1e-9)
    }
}

impl std::fmt::Display for RasterGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let top_left = self.geo_transform.top_left();
        write!(
            f,
            "{} origin ({}, {}) cell size ({}, {})",
            self.size,
            top_left.x(),
            top_left.y(),
            self.cell_size_x(),
            self.cell_size_y()
        )
    }
}
