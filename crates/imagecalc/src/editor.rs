use geo::RasterDataset;

use crate::{
    BlockBuffer, Calculator, EditCalculator, Error, PixelCalculator, Result, ScanOptions, WindowBuffer,
    block::row_blocks,
    blockscanner::scan_in_place,
    window::check_window_size,
};

/// Outcome of an iterative edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationSummary {
    /// Number of executed passes, including the final pass without changes
    pub passes: usize,
    /// Number of passes that changed at least one pixel
    pub changing_passes: usize,
}

/// Rewrites a single raster in place with repeated windowed passes until a pass changes nothing.
///
/// Pixels are edited in row-major order and every edit is visible to the windows of the pixels
/// that follow it in the same pass, independent of the block size.
pub struct InPlaceIterativeEditor<'a> {
    dataset: &'a mut dyn RasterDataset,
    window_size: usize,
    options: ScanOptions,
}

impl<'a> InPlaceIterativeEditor<'a> {
    pub fn new(dataset: &'a mut dyn RasterDataset, window_size: usize, options: ScanOptions) -> Result<Self> {
        check_window_size(window_size)?;
        if dataset.band_count() == 0 {
            return Err(Error::InvalidArgument(format!("'{}' has no bands to edit", dataset.description())));
        }

        Ok(InPlaceIterativeEditor {
            dataset,
            window_size,
            options,
        })
    }

    pub fn dataset(&self) -> &dyn RasterDataset {
        &*self.dataset
    }

    /// Runs a single pass over the raster, returns true when any pixel changed
    pub fn run_pass(&mut self, calc: &mut dyn EditCalculator, pass: usize) -> Result<bool> {
        let size = self.dataset.raster_size();
        let bands = self.dataset.band_count();
        let radius = self.window_size / 2;
        let padding = calc.edge_padding();
        let block_rows = self.options.rows_per_block_with_halo(size.cols, bands * 2, 2 * radius, bands);

        let mut block = BlockBuffer::new(bands, size.cols);
        let mut out_block = BlockBuffer::new(bands, size.cols);
        let mut window = WindowBuffer::new(bands, self.window_size)?;
        let mut result = vec![0.0; bands];
        let mut changed = false;

        for (first_row, rows) in row_blocks(size.rows, block_rows) {
            let context_first = first_row.saturating_sub(radius);
            let context_end = (first_row + rows + radius).min(size.rows);
            block.load_dataset(&*self.dataset, context_first, context_end - context_first)?;
            out_block.resize(first_row, rows);

            for row in first_row..first_row + rows {
                for col in 0..size.cols {
                    let win = window.fill(&block, size, row, col, padding);
                    changed |= calc.edit(pass, &win, &mut result)?;
                    block.set_pixel(row, col, &result);
                    out_block.set_pixel(row, col, &result);
                }
            }

            out_block.write_to(self.dataset)?;
        }

        Ok(changed)
    }

    /// Runs passes until a pass reports no change.
    /// Fails with [`Error::NoConvergence`] when the maximum number of passes is reached first.
    pub fn run(&mut self, calc: &mut dyn EditCalculator) -> Result<IterationSummary> {
        log::info!(
            "Iterative edit of '{}' {} with window size {}",
            self.dataset.description(),
            self.dataset.raster_size(),
            self.window_size
        );

        let mut pass = 0;
        loop {
            if let Some(max_passes) = self.options.max_passes()
                && pass >= max_passes
            {
                return Err(Error::NoConvergence(max_passes));
            }

            let changed = self.run_pass(calc, pass).map_err(|err| Error::Pass {
                pass,
                source: Box::new(err),
            })?;

            pass += 1;
            log::debug!("Pass {pass}: {}", if changed { "changed" } else { "no change" });
            if !changed {
                break;
            }
        }

        self.dataset.flush()?;
        log::info!("Converged after {pass} pass(es)");

        Ok(IterationSummary {
            passes: pass,
            changing_passes: pass - 1,
        })
    }

    /// Runs a calculator that must have the edit capability
    pub fn run_calculator(&mut self, mut calculator: Calculator<'_>) -> Result<IterationSummary> {
        self.run(calculator.as_edit("iterative edit")?)
    }

    /// Runs a single pixel pass over the raster, writing the result back in place
    pub fn apply_pixel_pass(&mut self, calc: &mut dyn PixelCalculator) -> Result<()> {
        scan_in_place(self.dataset, calc, &self.options)
    }
}
