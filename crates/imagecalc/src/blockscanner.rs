use geo::RasterDataset;

use crate::{
    BandBinding, BandStack, BlockBuffer, Calculator, Error, Output, PixelCalculator, Result, ScanOptions,
    block::row_blocks,
    output::create_output,
    progress::Progress,
};

/// Streams the pixels of aligned input rasters through a [`PixelCalculator`] in blocks of rows.
///
/// The bands of the inputs are concatenated into one band vector per pixel, following the band bindings.
/// Pixels are visited in row-major order, the output raster (if any) gets the grid of the first input.
pub struct BlockScanner<'a> {
    stack: BandStack<'a>,
    options: ScanOptions,
}

impl<'a> BlockScanner<'a> {
    /// Scanner over all the bands of the inputs
    pub fn new(inputs: &[&'a dyn RasterDataset], options: ScanOptions) -> Result<Self> {
        Ok(BlockScanner {
            stack: BandStack::new(inputs)?,
            options,
        })
    }

    pub fn with_bindings(inputs: &[&'a dyn RasterDataset], bindings: Vec<BandBinding>, options: ScanOptions) -> Result<Self> {
        Ok(BlockScanner {
            stack: BandStack::with_bindings(inputs, bindings)?,
            options,
        })
    }

    /// Number of values in the band vector passed to the calculator
    pub fn band_count(&self) -> usize {
        self.stack.band_count()
    }

    /// Runs the calculator on every pixel.
    /// Returns the output raster, or `None` when the calculator has no output bands.
    pub fn scan(&self, calc: &mut dyn PixelCalculator, output: Option<Output<'_>>) -> Result<Option<Box<dyn RasterDataset>>> {
        let grid = self.stack.grid();
        let size = grid.size();
        let out_bands = calc.output_band_count();
        calc.check_band_count(self.stack.band_count())?;
        let mut out_ds = create_output(output, grid, out_bands)?;

        let block_rows = self.options.rows_per_block(size.cols, self.stack.band_count() + out_bands);
        log::info!(
            "Pixel scan of {size} with {} input band(s) and {out_bands} output band(s), {block_rows} row(s) per block",
            self.stack.band_count()
        );

        let mut block = BlockBuffer::new(self.stack.band_count(), size.cols);
        let mut out_block = BlockBuffer::new(out_bands, size.cols);
        let mut pixel = vec![0.0; self.stack.band_count()];
        let mut result = vec![0.0; out_bands];
        let mut progress = Progress::new("Pixel scan", size.rows);

        for (first_row, rows) in row_blocks(size.rows, block_rows) {
            block.load_stack(&self.stack, first_row, rows)?;
            out_block.resize(first_row, rows);

            for row in first_row..first_row + rows {
                for col in 0..size.cols {
                    block.pixel(row, col, &mut pixel);
                    calc.pixel(&pixel, &mut result)?;
                    out_block.set_pixel(row, col, &result);
                }
            }

            if let Some(ds) = out_ds.as_deref_mut() {
                out_block.write_to(ds)?;
            }

            progress.update(first_row + rows);
        }

        if let Some(ds) = out_ds.as_deref_mut() {
            ds.flush()?;
        }

        Ok(out_ds)
    }

    /// Runs a calculator that must have the pixel capability
    pub fn run(&self, mut calculator: Calculator<'_>, output: Option<Output<'_>>) -> Result<Option<Box<dyn RasterDataset>>> {
        self.scan(calculator.as_pixel("pixel scan")?, output)
    }
}

/// Runs a pixel calculator over all the bands of the dataset and writes the result back to it.
/// The calculator must produce a value for every band of the dataset.
pub fn scan_in_place(ds: &mut dyn RasterDataset, calc: &mut dyn PixelCalculator, options: &ScanOptions) -> Result<()> {
    let bands = ds.band_count();
    calc.check_band_count(bands)?;
    if calc.output_band_count() != bands {
        return Err(Error::OutputBandMismatch {
            expected: calc.output_band_count(),
            actual: bands,
        });
    }

    let size = ds.raster_size();
    let block_rows = options.rows_per_block(size.cols, bands);
    log::info!("In place pixel scan of '{}' {size} with {bands} band(s)", ds.description());

    let mut block = BlockBuffer::new(bands, size.cols);
    let mut pixel = vec![0.0; bands];
    let mut result = vec![0.0; bands];
    let mut progress = Progress::new("In place pixel scan", size.rows);

    for (first_row, rows) in row_blocks(size.rows, block_rows) {
        block.load_dataset(ds, first_row, rows)?;
        for row in first_row..first_row + rows {
            for col in 0..size.cols {
                block.pixel(row, col, &mut pixel);
                calc.pixel(&pixel, &mut result)?;
                block.set_pixel(row, col, &result);
            }
        }

        block.write_to(ds)?;
        progress.update(first_row + rows);
    }

    ds.flush()?;
    Ok(())
}
