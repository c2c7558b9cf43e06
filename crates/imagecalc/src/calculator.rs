//! The capabilities a calculator can offer to the scanners.
//!
//! Every calculator implements exactly the capability it needs. The scanners drive a capability
//! directly, or generically through the [`Calculator`] enum which reports an
//! [`Error::UnsupportedOperation`] when a scanner is handed a calculator of the wrong kind.

use crate::{Error, Result, Window};

/// How a window is filled at positions outside of the raster extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgePadding {
    /// Use the value of the nearest row/column inside the raster
    Replicate,
    /// Use a fixed sentinel value
    Constant(f64),
}

/// Calculates output values from the band values of a single pixel
pub trait PixelCalculator {
    /// Number of values written to the output slice for every pixel, 0 when nothing gets written
    fn output_band_count(&self) -> usize;

    /// Called by the scanners before any output is created with the length of the band vectors that will be passed
    fn check_band_count(&self, _band_count: usize) -> Result<()> {
        Ok(())
    }

    fn pixel(&mut self, bands: &[f64], output: &mut [f64]) -> Result<()>;
}

/// Calculates output values from the neighbourhood window around a pixel
pub trait WindowCalculator {
    fn output_band_count(&self) -> usize;

    /// Called by the scanners before any output is created with the band count of the windows
    fn check_band_count(&self, _band_count: usize) -> Result<()> {
        Ok(())
    }

    fn edge_padding(&self) -> EdgePadding {
        EdgePadding::Replicate
    }

    fn window(&mut self, window: &Window<'_>, output: &mut [f64]) -> Result<()>;
}

/// Accumulates the band values of every pixel of an image into a single result
pub trait Accumulator {
    /// Number of values in the finalized result
    fn result_len(&self) -> usize;
    fn accumulate(&mut self, bands: &[f64]) -> Result<()>;
    fn finalize(&self) -> Result<Vec<f64>>;
    fn reset(&mut self);
}

/// Accumulates the band values of every pixel pair of two co-registered images into a single result
pub trait PairAccumulator {
    fn result_len(&self) -> usize;
    fn accumulate_pair(&mut self, a: &[f64], b: &[f64]) -> Result<()>;
    fn finalize(&self) -> Result<Vec<f64>>;
    fn reset(&mut self);
}

/// Rewrites a raster in place during repeated passes until nothing changes.
///
/// The output slice has the band count of the edited raster.
/// Returns true when the output differs from the current value of the pixel.
pub trait EditCalculator {
    fn edge_padding(&self) -> EdgePadding {
        EdgePadding::Replicate
    }

    fn edit(&mut self, pass: usize, window: &Window<'_>, output: &mut [f64]) -> Result<bool>;
}

/// Fails when a calculator that works on exactly `expected` bands gets `actual` bands
pub fn check_input_band_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::InputBandMismatch { expected, actual });
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorKind {
    Pixel,
    Window,
    Accumulate,
    AccumulatePair,
    Edit,
}

impl std::fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CalculatorKind::Pixel => "pixel",
            CalculatorKind::Window => "window",
            CalculatorKind::Accumulate => "accumulate",
            CalculatorKind::AccumulatePair => "pairwise accumulate",
            CalculatorKind::Edit => "edit",
        })
    }
}

/// A calculator with exactly one capability, used to drive the scanners generically
pub enum Calculator<'a> {
    Pixel(&'a mut dyn PixelCalculator),
    Window(&'a mut dyn WindowCalculator),
    Accumulate(&'a mut dyn Accumulator),
    AccumulatePair(&'a mut dyn PairAccumulator),
    Edit(&'a mut dyn EditCalculator),
}

impl<'a> Calculator<'a> {
    pub fn kind(&self) -> CalculatorKind {
        match self {
            Calculator::Pixel(_) => CalculatorKind::Pixel,
            Calculator::Window(_) => CalculatorKind::Window,
            Calculator::Accumulate(_) => CalculatorKind::Accumulate,
            Calculator::AccumulatePair(_) => CalculatorKind::AccumulatePair,
            Calculator::Edit(_) => CalculatorKind::Edit,
        }
    }

    fn unsupported(kind: CalculatorKind, operation: &'static str) -> Error {
        Error::UnsupportedOperation {
            calculator: kind,
            operation,
        }
    }

    pub fn as_pixel(&mut self, operation: &'static str) -> Result<&mut (dyn PixelCalculator + 'a)> {
        let kind = self.kind();
        match self {
            Calculator::Pixel(calc) => Ok(&mut **calc),
            _ => Err(Self::unsupported(kind, operation)),
        }
    }

    pub fn as_window(&mut self, operation: &'static str) -> Result<&mut (dyn WindowCalculator + 'a)> {
        let kind = self.kind();
        match self {
            Calculator::Window(calc) => Ok(&mut **calc),
            _ => Err(Self::unsupported(kind, operation)),
        }
    }

    pub fn as_accumulator(&mut self, operation: &'static str) -> Result<&mut (dyn Accumulator + 'a)> {
        let kind = self.kind();
        match self {
            Calculator::Accumulate(calc) => Ok(&mut **calc),
            _ => Err(Self::unsupported(kind, operation)),
        }
    }

    pub fn as_pair_accumulator(&mut self, operation: &'static str) -> Result<&mut (dyn PairAccumulator + 'a)> {
        let kind = self.kind();
        match self {
            Calculator::AccumulatePair(calc) => Ok(&mut **calc),
            _ => Err(Self::unsupported(kind, operation)),
        }
    }

    pub fn as_edit(&mut self, operation: &'static str) -> Result<&mut (dyn EditCalculator + 'a)> {
        let kind = self.kind();
        match self {
            Calculator::Edit(calc) => Ok(&mut **calc),
            _ => Err(Self::unsupported(kind, operation)),
        }
    }
}

/// Runs a pixel calculator on the centre pixel of every window
pub struct CentrePixel<C> {
    calculator: C,
    pixel: Vec<f64>,
}

impl<C: PixelCalculator> CentrePixel<C> {
    pub fn new(calculator: C) -> Self {
        CentrePixel {
            calculator,
            pixel: Vec::new(),
        }
    }

    pub fn into_inner(self) -> C {
        self.calculator
    }
}

impl<C: PixelCalculator> WindowCalculator for CentrePixel<C> {
    fn output_band_count(&self) -> usize {
        self.calculator.output_band_count()
    }

    fn check_band_count(&self, band_count: usize) -> Result<()> {
        self.calculator.check_band_count(band_count)
    }

    fn window(&mut self, window: &Window<'_>, output: &mut [f64]) -> Result<()> {
        self.pixel.resize(window.band_count(), 0.0);
        window.centre_pixel(&mut self.pixel);
        self.calculator.pixel(&self.pixel, output)
    }
}

/// Decides which pixels are skipped by calculators that sample or accumulate pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NodataPolicy {
    /// Every pixel is used
    #[default]
    None,
    /// Pixels with all band values equal to zero are skipped
    AllZero,
    /// Pixels with all band values equal to the value are skipped
    AllEqual(f64),
}

impl NodataPolicy {
    pub fn skips(&self, bands: &[f64]) -> bool {
        match *self {
            NodataPolicy::None => false,
            NodataPolicy::AllZero => bands.iter().all(|&v| v == 0.0),
            NodataPolicy::AllEqual(nodata) => bands.iter().all(|&v| v == nodata || (nodata.is_nan() && v.is_nan())),
        }
    }
}
