//! Concatenation of the bands of several aligned rasters into one logical band stack.

use geo::{BandIndex, RasterDataset, RasterGrid, band_index};

use crate::{Error, Result};

/// Binds a band of one of the input rasters to a slot in the logical band stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandBinding {
    /// Index of the raster in the list of inputs
    pub dataset_index: usize,
    /// Band of that raster
    pub local_band: BandIndex,
    /// Position of the band in the band vector passed to the calculators
    pub global_offset: usize,
}

impl BandBinding {
    pub fn new(dataset_index: usize, local_band: BandIndex, global_offset: usize) -> Self {
        BandBinding {
            dataset_index,
            local_band,
            global_offset,
        }
    }

    /// Bindings for all the bands of the inputs, in input order
    pub fn stack_all(inputs: &[&dyn RasterDataset]) -> Result<Vec<BandBinding>> {
        let mut bindings = Vec::new();
        for (dataset_index, ds) in inputs.iter().enumerate() {
            for band in 1..=ds.band_count() {
                bindings.push(BandBinding::new(dataset_index, band_index(band)?, bindings.len()));
            }
        }

        Ok(bindings)
    }
}

/// Fails when not all the inputs share the pixel grid of the first input
pub fn check_grids(inputs: &[&dyn RasterDataset]) -> Result<()> {
    let reference = inputs.first().ok_or(Error::NoInputs)?;
    for ds in &inputs[1..] {
        if !ds.grid().is_aligned_with(reference.grid()) {
            return Err(Error::GridMismatch {
                reference: reference.description().to_string(),
                expected: reference.grid().to_string(),
                dataset: ds.description().to_string(),
                actual: ds.grid().to_string(),
            });
        }
    }

    Ok(())
}

/// Aligned input rasters with the bindings that map their bands to the band vector of a pixel.
///
/// Construction validates the inputs, no raster data is read.
pub struct BandStack<'a> {
    inputs: Vec<&'a dyn RasterDataset>,
    /// Sorted on global offset
    bindings: Vec<BandBinding>,
}

impl<'a> BandStack<'a> {
    /// Stacks all the bands of the inputs
    pub fn new(inputs: &[&'a dyn RasterDataset]) -> Result<Self> {
        let bindings = BandBinding::stack_all(inputs)?;
        Self::with_bindings(inputs, bindings)
    }

    pub fn with_bindings(inputs: &[&'a dyn RasterDataset], mut bindings: Vec<BandBinding>) -> Result<Self> {
        check_grids(inputs)?;

        if bindings.is_empty() {
            return Err(Error::InvalidBinding("no bands are bound".to_string()));
        }

        for binding in &bindings {
            let ds = inputs.get(binding.dataset_index).ok_or_else(|| {
                Error::InvalidBinding(format!(
                    "dataset index {} is out of range, {} input(s) provided",
                    binding.dataset_index,
                    inputs.len()
                ))
            })?;

            if binding.local_band.get() > ds.band_count() {
                return Err(Error::BandOutOfRange {
                    dataset: ds.description().to_string(),
                    band: binding.local_band.get(),
                    band_count: ds.band_count(),
                });
            }
        }

        bindings.sort_by_key(|binding| binding.global_offset);
        for (expected, binding) in bindings.iter().enumerate() {
            if binding.global_offset != expected {
                return Err(Error::InvalidBinding(format!(
                    "global offsets must cover 0..{} exactly once, offset {expected} is {}",
                    bindings.len(),
                    if binding.global_offset < expected { "duplicated" } else { "missing" }
                )));
            }
        }

        Ok(BandStack {
            inputs: inputs.to_vec(),
            bindings,
        })
    }

    /// Number of bands in the logical band stack
    pub fn band_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn grid(&self) -> &RasterGrid {
        self.inputs[0].grid()
    }

    pub fn inputs(&self) -> &[&'a dyn RasterDataset] {
        &self.inputs
    }

    /// The bindings in global offset order
    pub fn bindings(&self) -> &[BandBinding] {
        &self.bindings
    }

    pub fn dataset(&self, binding: &BandBinding) -> &'a dyn RasterDataset {
        self.inputs[binding.dataset_index]
    }
}
