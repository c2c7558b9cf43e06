//! Neighbourhood windows around a centre pixel.

use geo::RasterSize;
use inf::allocate::{self, AlignedVec};

use crate::{BlockBuffer, EdgePadding, Error, Result};

/// Fails when the window size is not odd
pub fn check_window_size(size: usize) -> Result<()> {
    if size % 2 == 0 {
        return Err(Error::InvalidWindowSize(size));
    }

    Ok(())
}

/// A `bands × size × size` cube of values centred on a pixel of the raster
pub struct Window<'a> {
    data: &'a [f64],
    bands: usize,
    size: usize,
    row: usize,
    col: usize,
}

impl<'a> Window<'a> {
    /// Window over a band-major cube of values
    pub fn new(data: &'a [f64], bands: usize, size: usize, row: usize, col: usize) -> Result<Self> {
        check_window_size(size)?;
        if data.len() != bands * size * size {
            return Err(Error::InvalidArgument(format!(
                "A window of {bands} band(s) with size {size} needs {} values, got {}",
                bands * size * size,
                data.len()
            )));
        }

        Ok(Window {
            data,
            bands,
            size,
            row,
            col,
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands
    }

    /// The width and height of the window
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of rows/columns on each side of the centre pixel
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Raster row of the centre pixel
    pub fn row(&self) -> usize {
        self.row
    }

    /// Raster column of the centre pixel
    pub fn col(&self) -> usize {
        self.col
    }

    /// Value at a position in the window, (0, 0) is the top left corner
    pub fn value(&self, band: usize, win_row: usize, win_col: usize) -> f64 {
        self.data[(band * self.size + win_row) * self.size + win_col]
    }

    /// All the values of a band in row-major order
    pub fn band(&self, band: usize) -> &[f64] {
        let len = self.size * self.size;
        &self.data[band * len..(band + 1) * len]
    }

    pub fn centre(&self, band: usize) -> f64 {
        self.value(band, self.radius(), self.radius())
    }

    /// Copies the values of all the bands at a window position into `dst`
    pub fn pixel(&self, win_row: usize, win_col: usize, dst: &mut [f64]) {
        for (band, value) in dst.iter_mut().enumerate().take(self.bands) {
            *value = self.value(band, win_row, win_col);
        }
    }

    pub fn centre_pixel(&self, dst: &mut [f64]) {
        self.pixel(self.radius(), self.radius(), dst);
    }
}

/// Reusable storage for the window cubes built from a block of rows
pub struct WindowBuffer {
    data: AlignedVec<f64>,
    bands: usize,
    size: usize,
}

impl WindowBuffer {
    pub fn new(bands: usize, size: usize) -> Result<Self> {
        check_window_size(size)?;
        Ok(WindowBuffer {
            data: allocate::aligned_vec_filled_with(0.0, bands * size * size),
            bands,
            size,
        })
    }

    /// Fills the window centred on (`row`, `col`) from the block.
    /// The block must contain the rows of the window that are inside the raster.
    pub fn fill(&mut self, block: &BlockBuffer, raster_size: RasterSize, row: usize, col: usize, padding: EdgePadding) -> Window<'_> {
        let radius = (self.size / 2) as isize;
        let rows = raster_size.rows as isize;
        let cols = raster_size.cols as isize;

        for band in 0..self.bands {
            for win_row in 0..self.size {
                let r = row as isize + win_row as isize - radius;
                for win_col in 0..self.size {
                    let c = col as isize + win_col as isize - radius;
                    let inside = r >= 0 && r < rows && c >= 0 && c < cols;

                    let value = match padding {
                        _ if inside => block.value(band, r as usize, c as usize),
                        EdgePadding::Replicate => block.value(band, r.clamp(0, rows - 1) as usize, c.clamp(0, cols - 1) as usize),
                        EdgePadding::Constant(sentinel) => sentinel,
                    };

                    self.data[(band * self.size + win_row) * self.size + win_col] = value;
                }
            }
        }

        Window {
            data: &self.data,
            bands: self.bands,
            size: self.size,
            row,
            col,
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{MemRaster, RasterDataset, RasterGrid};

    use super::*;

    fn block_3x3() -> Result<BlockBuffer> {
        #[rustfmt::skip]
        let ds = MemRaster::from_bands(
            "ds",
            RasterGrid::with_size(RasterSize::with_rows_cols(3, 3)),
            vec![vec![
                1.0, 2.0, 3.0,
                4.0, 5.0, 6.0,
                7.0, 8.0, 9.0,
            ]],
        )?;

        let mut block = BlockBuffer::new(1, 3);
        block.load_dataset(&ds, 0, ds.raster_size().rows)?;
        Ok(block)
    }

    #[test]
    fn window_inside_raster() -> Result<()> {
        let block = block_3x3()?;
        let mut buffer = WindowBuffer::new(1, 3)?;
        let win = buffer.fill(&block, RasterSize::square(3), 1, 1, EdgePadding::Replicate);

        assert_eq!(win.band(0), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(win.centre(0), 5.0);
        assert_eq!((win.row(), win.col(), win.radius()), (1, 1, 1));
        Ok(())
    }

    #[test]
    fn edge_padding() -> Result<()> {
        let block = block_3x3()?;
        let mut buffer = WindowBuffer::new(1, 3)?;

        let win = buffer.fill(&block, RasterSize::square(3), 0, 0, EdgePadding::Replicate);
        assert_eq!(win.band(0), &[1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0, 4.0, 5.0]);

        let win = buffer.fill(&block, RasterSize::square(3), 2, 2, EdgePadding::Constant(-1.0));
        assert_eq!(win.band(0), &[5.0, 6.0, -1.0, 8.0, 9.0, -1.0, -1.0, -1.0, -1.0]);
        Ok(())
    }

    #[test]
    fn window_size_must_be_odd() {
        assert!(matches!(WindowBuffer::new(1, 4), Err(Error::InvalidWindowSize(4))));
        assert!(matches!(WindowBuffer::new(1, 0), Err(Error::InvalidWindowSize(0))));
        assert!(WindowBuffer::new(1, 1).is_ok());
        assert!(Window::new(&[0.0; 9], 1, 3, 0, 0).is_ok());
        assert!(Window::new(&[0.0; 8], 1, 3, 0, 0).is_err());
    }
}
