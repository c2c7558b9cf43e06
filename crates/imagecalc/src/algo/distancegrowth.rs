//! Distance transform by growing a wavefront from seed pixels, one pixel ring per pass.
//!
//! Cell encoding: `-1` unvisited, `0` seed, `k` (or `k + 0.5`) visited at depth `k`.
//! During pass `k` every unvisited cell with an 8-connected neighbour at depth `k` gets depth `k + 1`,
//! so after the transform every cell holds its Chebyshev distance to the nearest seed in pixels.

use geo::RasterDataset;

use crate::{
    EdgePadding, EditCalculator, Error, InPlaceIterativeEditor, IterationSummary, PixelCalculator, Result, ScanOptions,
    Window,
};

/// Value of a cell that has not been reached yet
pub const UNVISITED: f64 = -1.0;

/// Window size of the distance growth: the 8-connected neighbourhood
pub const DISTANCE_GROWTH_WINDOW: usize = 3;

/// Grows the visited region by one pixel in every pass
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceGrowth;

impl DistanceGrowth {
    pub fn new() -> Self {
        DistanceGrowth
    }

    fn has_neighbour_at_depth(window: &Window<'_>, depth: f64) -> bool {
        let centre = window.radius();
        (0..window.size())
            .flat_map(|r| (0..window.size()).map(move |c| (r, c)))
            .filter(|&(r, c)| r != centre || c != centre)
            .map(|(r, c)| window.value(0, r, c))
            .any(|v| v == depth || v == depth + 0.5)
    }
}

impl EditCalculator for DistanceGrowth {
    fn edge_padding(&self) -> EdgePadding {
        EdgePadding::Constant(UNVISITED)
    }

    fn edit(&mut self, pass: usize, window: &Window<'_>, output: &mut [f64]) -> Result<bool> {
        let current = window.centre(0);
        window.centre_pixel(output);

        let depth = pass as f64;
        if current == UNVISITED && Self::has_neighbour_at_depth(window, depth) {
            output[0] = depth + 1.0;
            return Ok(true);
        }

        Ok(false)
    }
}

/// Converts depths in pixels to distances by multiplying visited cells with the pixel resolution
#[derive(Debug, Clone, Copy)]
pub struct ScaleDepth {
    resolution: f64,
}

impl ScaleDepth {
    pub fn new(resolution: f64) -> Self {
        ScaleDepth { resolution }
    }
}

impl PixelCalculator for ScaleDepth {
    fn output_band_count(&self) -> usize {
        1
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()> {
        output[0] = if bands[0] >= 0.0 { bands[0] * self.resolution } else { bands[0] };
        Ok(())
    }
}

/// Turns pixels with the seed value into seeds (0), all other pixels become [`UNVISITED`]
#[derive(Debug, Clone, Copy)]
pub struct SeedMask {
    seed_value: f64,
}

impl SeedMask {
    pub fn new(seed_value: f64) -> Self {
        SeedMask { seed_value }
    }
}

impl PixelCalculator for SeedMask {
    fn output_band_count(&self) -> usize {
        1
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()> {
        output[0] = if bands[0] == self.seed_value { 0.0 } else { UNVISITED };
        Ok(())
    }
}

/// Runs the distance growth on a single band raster prepared with seeds (0) and unvisited cells (-1),
/// followed by a pass that converts the depths to distances in map units.
///
/// Cells that can not be reached keep the [`UNVISITED`] value.
pub fn distance_transform(ds: &mut dyn RasterDataset, options: ScanOptions) -> Result<IterationSummary> {
    if ds.band_count() != 1 {
        return Err(Error::InvalidArgument(format!(
            "Distance transform requires a single band raster, '{}' has {} bands",
            ds.description(),
            ds.band_count()
        )));
    }

    let resolution = ds.grid().resolution();
    let mut editor = InPlaceIterativeEditor::new(ds, DISTANCE_GROWTH_WINDOW, options)?;
    let summary = editor.run(&mut DistanceGrowth::new())?;
    editor.apply_pixel_pass(&mut ScaleDepth::new(resolution))?;

    log::info!("Distance transform reached a depth of {} pixel(s)", summary.changing_passes);
    Ok(summary)
}
