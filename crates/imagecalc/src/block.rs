//! Row blocks that are streamed through the scanners.

use geo::{RasterDataset, band_index};
use inf::allocate::{self, AlignedVec};

use crate::{BandStack, Error, Result};

/// Splits `rows` into consecutive blocks of at most `block_rows` rows.
/// Yields the first row and the row count of every block.
pub fn row_blocks(rows: usize, block_rows: usize) -> impl Iterator<Item = (usize, usize)> {
    let block_rows = block_rows.max(1);
    (0..rows).step_by(block_rows).map(move |first_row| (first_row, block_rows.min(rows - first_row)))
}

/// Band-major buffer holding a contiguous run of complete raster rows for a number of bands.
///
/// Rows are addressed with their row index in the raster.
/// The allocation is reused when a new block of rows is loaded.
pub struct BlockBuffer {
    data: AlignedVec<f64>,
    bands: usize,
    cols: usize,
    first_row: usize,
    rows: usize,
}

impl BlockBuffer {
    pub fn new(bands: usize, cols: usize) -> Self {
        BlockBuffer {
            data: allocate::new_aligned_vec(),
            bands,
            cols,
            first_row: 0,
            rows: 0,
        }
    }

    pub fn band_count(&self) -> usize {
        self.bands
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// One past the last row in the block
    pub fn end_row(&self) -> usize {
        self.first_row + self.rows
    }

    /// Sets the row range covered by the buffer, the contents are unspecified until loaded or written
    pub fn resize(&mut self, first_row: usize, rows: usize) {
        allocate::resize_aligned_vec(&mut self.data, self.bands * rows * self.cols, 0.0);
        self.first_row = first_row;
        self.rows = rows;
    }

    /// Reads the rows of all the bands of the band stack
    pub fn load_stack(&mut self, stack: &BandStack<'_>, first_row: usize, rows: usize) -> Result<()> {
        debug_assert_eq!(self.bands, stack.band_count());
        self.resize(first_row, rows);
        for binding in stack.bindings() {
            let ds = stack.dataset(binding);
            read_band_rows(ds, binding.local_band.get(), first_row, self.band_mut(binding.global_offset))?;
        }

        Ok(())
    }

    /// Reads the rows of all the bands of the dataset
    pub fn load_dataset(&mut self, ds: &dyn RasterDataset, first_row: usize, rows: usize) -> Result<()> {
        debug_assert_eq!(self.bands, ds.band_count());
        self.resize(first_row, rows);
        for band in 0..self.bands {
            read_band_rows(ds, band + 1, first_row, self.band_mut(band))?;
        }

        Ok(())
    }

    /// Writes the block to the same rows of the dataset, the dataset must have the band count of the block
    pub fn write_to(&self, ds: &mut dyn RasterDataset) -> Result<()> {
        for band in 0..self.bands {
            let band_nr = band + 1;
            ds.write_rows(band_index(band_nr)?, self.first_row, self.band(band))
                .map_err(|source| Error::Write {
                    dataset: ds.description().to_string(),
                    band: band_nr,
                    row: self.first_row,
                    source,
                })?;
        }

        Ok(())
    }

    /// The rows of a band
    pub fn band(&self, band: usize) -> &[f64] {
        let len = self.rows * self.cols;
        &self.data[band * len..(band + 1) * len]
    }

    fn band_mut(&mut self, band: usize) -> &mut [f64] {
        let len = self.rows * self.cols;
        &mut self.data[band * len..(band + 1) * len]
    }

    fn index(&self, band: usize, row: usize, col: usize) -> usize {
        debug_assert!(row >= self.first_row && row < self.end_row());
        (band * self.rows + (row - self.first_row)) * self.cols + col
    }

    pub fn value(&self, band: usize, row: usize, col: usize) -> f64 {
        self.data[self.index(band, row, col)]
    }

    /// Copies the values of all the bands of a pixel into `dst`
    pub fn pixel(&self, row: usize, col: usize, dst: &mut [f64]) {
        for (band, value) in dst.iter_mut().enumerate().take(self.bands) {
            *value = self.value(band, row, col);
        }
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, values: &[f64]) {
        for (band, &value) in values.iter().enumerate().take(self.bands) {
            let index = self.index(band, row, col);
            self.data[index] = value;
        }
    }
}

fn read_band_rows(ds: &dyn RasterDataset, band: usize, first_row: usize, dst: &mut [f64]) -> Result<()> {
    ds.read_rows(band_index(band)?, first_row, dst).map_err(|source| Error::Read {
        dataset: ds.description().to_string(),
        band,
        row: first_row,
        source,
    })
}
