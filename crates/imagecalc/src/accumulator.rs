use geo::{BandIndex, RasterDataset};

use crate::{
    Accumulator, BandBinding, BandStack, BlockBuffer, Calculator, CalculatorKind, Error, PairAccumulator, Result, ScanOptions,
    bandstack::check_grids,
    block::row_blocks,
    progress::Progress,
};

enum Streams<'a> {
    Single(BandStack<'a>),
    Pair(BandStack<'a>, BandStack<'a>),
}

/// Streams every pixel (or every pixel pair of two co-registered images) through an accumulator
/// and returns the finalized result. No raster is written.
///
/// At most one block of rows per image is held in memory.
pub struct SingleValueAccumulator<'a> {
    streams: Streams<'a>,
    options: ScanOptions,
}

impl<'a> SingleValueAccumulator<'a> {
    /// Accumulates the concatenated bands of the inputs
    pub fn new(inputs: &[&'a dyn RasterDataset], options: ScanOptions) -> Result<Self> {
        Ok(SingleValueAccumulator {
            streams: Streams::Single(BandStack::new(inputs)?),
            options,
        })
    }

    pub fn with_bindings(inputs: &[&'a dyn RasterDataset], bindings: Vec<BandBinding>, options: ScanOptions) -> Result<Self> {
        Ok(SingleValueAccumulator {
            streams: Streams::Single(BandStack::with_bindings(inputs, bindings)?),
            options,
        })
    }

    /// Accumulates the pixel pairs of a band of `a` and a band of `b`
    pub fn pairwise(
        a: &'a dyn RasterDataset,
        band_a: BandIndex,
        b: &'a dyn RasterDataset,
        band_b: BandIndex,
        options: ScanOptions,
    ) -> Result<Self> {
        check_grids(&[a, b])?;
        Ok(SingleValueAccumulator {
            streams: Streams::Pair(
                BandStack::with_bindings(&[a], vec![BandBinding::new(0, band_a, 0)])?,
                BandStack::with_bindings(&[b], vec![BandBinding::new(0, band_b, 0)])?,
            ),
            options,
        })
    }

    /// Accumulates the pixel pairs of all the bands of `a` and all the bands of `b`
    pub fn pairwise_all_bands(a: &'a dyn RasterDataset, b: &'a dyn RasterDataset, options: ScanOptions) -> Result<Self> {
        check_grids(&[a, b])?;
        Ok(SingleValueAccumulator {
            streams: Streams::Pair(BandStack::new(&[a])?, BandStack::new(&[b])?),
            options,
        })
    }

    /// Resets the accumulator, streams every pixel through it and returns the finalized result
    pub fn accumulate(&self, acc: &mut dyn Accumulator) -> Result<Vec<f64>> {
        let Streams::Single(stack) = &self.streams else {
            return Err(Error::UnsupportedOperation {
                calculator: CalculatorKind::Accumulate,
                operation: "pairwise accumulation",
            });
        };

        let size = stack.grid().size();
        let block_rows = self.options.rows_per_block(size.cols, stack.band_count());
        log::info!("Accumulating {size} with {} band(s)", stack.band_count());

        acc.reset();
        let mut block = BlockBuffer::new(stack.band_count(), size.cols);
        let mut pixel = vec![0.0; stack.band_count()];
        let mut progress = Progress::new("Accumulate", size.rows);

        for (first_row, rows) in row_blocks(size.rows, block_rows) {
            block.load_stack(stack, first_row, rows)?;
            for row in first_row..first_row + rows {
                for col in 0..size.cols {
                    block.pixel(row, col, &mut pixel);
                    acc.accumulate(&pixel)?;
                }
            }

            progress.update(first_row + rows);
        }

        check_result_len(acc.finalize()?, acc.result_len())
    }

    /// Resets the accumulator, streams every pixel pair through it and returns the finalized result
    pub fn accumulate_pairs(&self, acc: &mut dyn PairAccumulator) -> Result<Vec<f64>> {
        let Streams::Pair(stack_a, stack_b) = &self.streams else {
            return Err(Error::UnsupportedOperation {
                calculator: CalculatorKind::AccumulatePair,
                operation: "single image accumulation",
            });
        };

        let size = stack_a.grid().size();
        let block_rows = self
            .options
            .rows_per_block(size.cols, stack_a.band_count() + stack_b.band_count());
        log::info!(
            "Accumulating pixel pairs of {size} with {} and {} band(s)",
            stack_a.band_count(),
            stack_b.band_count()
        );

        acc.reset();
        let mut block_a = BlockBuffer::new(stack_a.band_count(), size.cols);
        let mut block_b = BlockBuffer::new(stack_b.band_count(), size.cols);
        let mut pixel_a = vec![0.0; stack_a.band_count()];
        let mut pixel_b = vec![0.0; stack_b.band_count()];
        let mut progress = Progress::new("Accumulate pairs", size.rows);

        for (first_row, rows) in row_blocks(size.rows, block_rows) {
            block_a.load_stack(stack_a, first_row, rows)?;
            block_b.load_stack(stack_b, first_row, rows)?;
            for row in first_row..first_row + rows {
                for col in 0..size.cols {
                    block_a.pixel(row, col, &mut pixel_a);
                    block_b.pixel(row, col, &mut pixel_b);
                    acc.accumulate_pair(&pixel_a, &pixel_b)?;
                }
            }

            progress.update(first_row + rows);
        }

        check_result_len(acc.finalize()?, acc.result_len())
    }

    /// Runs a calculator that must have one of the accumulate capabilities
    pub fn run(&self, calculator: Calculator<'_>) -> Result<Vec<f64>> {
        match calculator {
            Calculator::Accumulate(acc) => self.accumulate(acc),
            Calculator::AccumulatePair(acc) => self.accumulate_pairs(acc),
            other => Err(Error::UnsupportedOperation {
                calculator: other.kind(),
                operation: "single value accumulation",
            }),
        }
    }
}

fn check_result_len(result: Vec<f64>, expected: usize) -> Result<Vec<f64>> {
    if result.len() != expected {
        return Err(Error::OutputBandMismatch {
            expected,
            actual: result.len(),
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use geo::{FIRST_BAND, MemRaster, RasterGrid, RasterSize, band_index};

    use super::*;

    #[derive(Default)]
    struct Count {
        n: usize,
        sum: f64,
    }

    impl Accumulator for Count {
        fn result_len(&self) -> usize {
            2
        }

        fn accumulate(&mut self, bands: &[f64]) -> Result<()> {
            self.n += 1;
            self.sum += bands.iter().sum::<f64>();
            Ok(())
        }

        fn finalize(&self) -> Result<Vec<f64>> {
            Ok(vec![self.n as f64, self.sum])
        }

        fn reset(&mut self) {
            *self = Count::default();
        }
    }

    #[derive(Default)]
    struct DotProduct {
        dot: f64,
    }

    impl PairAccumulator for DotProduct {
        fn result_len(&self) -> usize {
            1
        }

        fn accumulate_pair(&mut self, a: &[f64], b: &[f64]) -> Result<()> {
            self.dot += a.iter().zip(b).map(|(a, b)| a * b).sum::<f64>();
            Ok(())
        }

        fn finalize(&self) -> Result<Vec<f64>> {
            Ok(vec![self.dot])
        }

        fn reset(&mut self) {
            self.dot = 0.0;
        }
    }

    fn grid(rows: usize, cols: usize) -> RasterGrid {
        RasterGrid::with_size(RasterSize::with_rows_cols(rows, cols))
    }

    #[test_log::test]
    fn accumulate_is_reset_between_runs() -> Result<()> {
        let a = MemRaster::from_bands("a", grid(3, 3), vec![vec![1.0; 9], vec![2.0; 9]])?;
        let scanner = SingleValueAccumulator::new(&[&a], ScanOptions::builder().block_rows(2).build())?;

        let mut count = Count::default();
        assert_eq!(scanner.accumulate(&mut count)?, vec![9.0, 27.0]);
        assert_eq!(scanner.run(Calculator::Accumulate(&mut count))?, vec![9.0, 27.0]);
        Ok(())
    }

    #[test_log::test]
    fn pairwise_bands() -> Result<()> {
        let a = MemRaster::from_bands("a", grid(2, 2), vec![vec![1.0, 2.0, 3.0, 4.0], vec![0.0; 4]])?;
        let b = MemRaster::from_bands("b", grid(2, 2), vec![vec![2.0; 4]])?;

        let scanner = SingleValueAccumulator::pairwise(&a, FIRST_BAND, &b, FIRST_BAND, ScanOptions::default())?;
        assert_eq!(scanner.accumulate_pairs(&mut DotProduct::default())?, vec![20.0]);
        assert!(matches!(
            scanner.accumulate(&mut Count::default()),
            Err(Error::UnsupportedOperation { .. })
        ));

        let scanner = SingleValueAccumulator::pairwise(&a, band_index(2)?, &b, FIRST_BAND, ScanOptions::default())?;
        assert_eq!(scanner.run(Calculator::AccumulatePair(&mut DotProduct::default()))?, vec![0.0]);

        assert!(matches!(
            SingleValueAccumulator::pairwise(&a, band_index(3)?, &b, FIRST_BAND, ScanOptions::default()),
            Err(Error::BandOutOfRange { band: 3, .. })
        ));
        Ok(())
    }

    #[test]
    fn pairwise_grid_mismatch() -> Result<()> {
        let a = MemRaster::from_bands("a", grid(2, 2), vec![vec![1.0; 4]])?;
        let b = MemRaster::from_bands("b", grid(2, 3), vec![vec![1.0; 6]])?;
        assert!(matches!(
            SingleValueAccumulator::pairwise_all_bands(&a, &b, ScanOptions::default()),
            Err(Error::GridMismatch { .. })
        ));
        Ok(())
    }
}
