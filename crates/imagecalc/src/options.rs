use bon::bon;

/// Memory budget for the row blocks of a scan when no explicit block height is configured
pub const DEFAULT_BLOCK_MEMORY: usize = 64 * 1024 * 1024;

/// Settings shared by all the scanners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    block_rows: Option<usize>,
    block_memory: usize,
    max_passes: Option<usize>,
}

#[bon]
impl ScanOptions {
    /// * `block_rows` - fixed number of rows per block, overrides the memory budget
    /// * `block_memory` - byte budget for the buffers of one block
    /// * `max_passes` - maximum number of passes of the iterative editor, unbounded when absent
    #[builder]
    pub fn new(block_rows: Option<usize>, block_memory: Option<usize>, max_passes: Option<usize>) -> Self {
        ScanOptions {
            block_rows,
            block_memory: block_memory.unwrap_or(DEFAULT_BLOCK_MEMORY),
            max_passes,
        }
    }

    pub fn max_passes(&self) -> Option<usize> {
        self.max_passes
    }

    /// Number of rows per block for rasters with `cols` columns when `bands` bands of `f64` values are buffered
    pub fn rows_per_block(&self, cols: usize, bands: usize) -> usize {
        self.rows_per_block_with_halo(cols, bands, 0, 0)
    }

    /// Number of rows per block when every block also buffers `halo_rows` extra rows of `halo_bands` bands.
    /// The halo rows count against the memory budget.
    pub fn rows_per_block_with_halo(&self, cols: usize, bands: usize, halo_rows: usize, halo_bands: usize) -> usize {
        let rows = match self.block_rows {
            Some(rows) => rows,
            None => {
                let budget_rows = self.block_memory / (cols.max(1) * std::mem::size_of::<f64>());
                budget_rows.saturating_sub(halo_rows * halo_bands) / bands.max(1)
            }
        };

        rows.max(1)
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_height() {
        let options = ScanOptions::default();
        assert_eq!(options.rows_per_block(1024, 8), DEFAULT_BLOCK_MEMORY / (1024 * 8 * 8));
        assert_eq!(options.max_passes(), None);

        let options = ScanOptions::builder().block_rows(3).build();
        assert_eq!(options.rows_per_block(1024, 8), 3);

        let options = ScanOptions::builder().block_memory(100).build();
        assert_eq!(options.rows_per_block(1024, 8), 1);

        let options = ScanOptions::builder().block_rows(0).max_passes(10).build();
        assert_eq!(options.rows_per_block(10, 1), 1);
        assert_eq!(options.max_passes(), Some(10));
    }

    #[test]
    fn halo_rows_count_against_the_budget() {
        // 100 rows of 10 columns
        let options = ScanOptions::builder().block_memory(100 * 10 * 8).build();
        assert_eq!(options.rows_per_block_with_halo(10, 2, 0, 0), 50);
        // 2 x 10 halo rows of 1 band leave 80 rows for 2 bands
        assert_eq!(options.rows_per_block_with_halo(10, 2, 20, 1), 40);
        assert_eq!(options.rows_per_block_with_halo(10, 2, 200, 1), 1);

        let options = ScanOptions::builder().block_rows(7).build();
        assert_eq!(options.rows_per_block_with_halo(10, 2, 200, 1), 7);
    }
}
