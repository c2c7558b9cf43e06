use geo::RasterDataset;

use crate::{
    BandBinding, BandStack, BlockBuffer, Calculator, Output, Result, ScanOptions, WindowBuffer, WindowCalculator,
    block::row_blocks,
    output::create_output,
    progress::Progress,
    window::check_window_size,
};

/// Streams square neighbourhood windows of aligned input rasters through a [`WindowCalculator`].
///
/// Every block of rows is loaded together with `(window_size - 1) / 2` rows of context above and below,
/// window positions outside of the raster are filled according to the edge padding of the calculator.
pub struct WindowScanner<'a> {
    stack: BandStack<'a>,
    window_size: usize,
    options: ScanOptions,
}

impl<'a> WindowScanner<'a> {
    pub fn new(inputs: &[&'a dyn RasterDataset], window_size: usize, options: ScanOptions) -> Result<Self> {
        let stack = BandStack::new(inputs)?;
        check_window_size(window_size)?;

        Ok(WindowScanner {
            stack,
            window_size,
            options,
        })
    }

    pub fn with_bindings(
        inputs: &[&'a dyn RasterDataset],
        bindings: Vec<BandBinding>,
        window_size: usize,
        options: ScanOptions,
    ) -> Result<Self> {
        let stack = BandStack::with_bindings(inputs, bindings)?;
        check_window_size(window_size)?;

        Ok(WindowScanner {
            stack,
            window_size,
            options,
        })
    }

    pub fn band_count(&self) -> usize {
        self.stack.band_count()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Runs the calculator on the window of every pixel.
    /// Returns the output raster, or `None` when the calculator has no output bands.
    pub fn scan(&self, calc: &mut dyn WindowCalculator, output: Option<Output<'_>>) -> Result<Option<Box<dyn RasterDataset>>> {
        let grid = self.stack.grid();
        let size = grid.size();
        let radius = self.window_size / 2;
        let out_bands = calc.output_band_count();
        let padding = calc.edge_padding();
        calc.check_band_count(self.stack.band_count())?;
        let mut out_ds = create_output(output, grid, out_bands)?;

        let block_rows = self.options.rows_per_block_with_halo(
            size.cols,
            self.stack.band_count() + out_bands,
            2 * radius,
            self.stack.band_count(),
        );
        log::info!(
            "Window scan of {size}, window size {} ({padding:?}), {} input and {out_bands} output band(s), {block_rows} row(s) per block",
            self.window_size,
            self.stack.band_count(),
        );

        let mut block = BlockBuffer::new(self.stack.band_count(), size.cols);
        let mut out_block = BlockBuffer::new(out_bands, size.cols);
        let mut window = WindowBuffer::new(self.stack.band_count(), self.window_size)?;
        let mut result = vec![0.0; out_bands];
        let mut progress = Progress::new("Window scan", size.rows);

        for (first_row, rows) in row_blocks(size.rows, block_rows) {
            let context_first = first_row.saturating_sub(radius);
            let context_end = (first_row + rows + radius).min(size.rows);
            block.load_stack(&self.stack, context_first, context_end - context_first)?;
            out_block.resize(first_row, rows);

            for row in first_row..first_row + rows {
                for col in 0..size.cols {
                    let win = window.fill(&block, size, row, col, padding);
                    calc.window(&win, &mut result)?;
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

    /// Runs a calculator that must have the window capability
    pub fn run(&self, mut calculator: Calculator<'_>, output: Option<Output<'_>>) -> Result<Option<Box<dyn RasterDataset>>> {
        self.scan(calculator.as_window("window scan")?, output)
    }
}
