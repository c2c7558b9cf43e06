#![warn(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Block streaming raster calculation engine.
//!
//! The engine streams aligned rasters through calculators, one block of rows at a time:
//! - [`BlockScanner`]: per pixel calculations ([`PixelCalculator`])
//! - [`WindowScanner`]: neighbourhood calculations on odd sized windows ([`WindowCalculator`])
//! - [`SingleValueAccumulator`]: whole image statistics ([`Accumulator`], [`PairAccumulator`])
//! - [`InPlaceIterativeEditor`]: repeated in place passes until a fixed point is reached ([`EditCalculator`])
//!
//! The [`algo`] module contains ready to use calculators.

pub type Result<T = ()> = std::result::Result<T, Error>;

mod accumulator;
pub mod algo;
mod bandstack;
mod block;
mod blockscanner;
mod calculator;
mod editor;
mod error;
mod matrix;
mod options;
mod output;
mod progress;
mod window;
mod windowscanner;

#[doc(inline)]
pub use accumulator::SingleValueAccumulator;
pub use bandstack::{BandBinding, BandStack, check_grids};
pub use block::BlockBuffer;
#[doc(inline)]
pub use blockscanner::{BlockScanner, scan_in_place};
pub use calculator::{
    Accumulator, Calculator, CalculatorKind, CentrePixel, EdgePadding, EditCalculator, NodataPolicy, PairAccumulator, PixelCalculator,
    WindowCalculator, check_input_band_count,
};
#[doc(inline)]
pub use editor::{InPlaceIterativeEditor, IterationSummary};
#[doc(inline)]
pub use error::Error;
pub use matrix::Matrix;
pub use options::{DEFAULT_BLOCK_MEMORY, ScanOptions};
pub use output::{Output, OutputSpec};
pub use window::{Window, WindowBuffer};
#[doc(inline)]
pub use windowscanner::WindowScanner;
