#![doc = include_str!("../README.md")]

// Public modules
pub mod binning;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod image;
pub mod masking;
pub mod pipeline;
pub mod stats;
pub mod types;

// --- High-level re-exports -------------------------------------------------

// Entry points and their configuration.
pub use crate::masking::AutoMaskParams;
pub use crate::pipeline::{auto_mask, auto_mask_with_binner, AutoMasker};

// Building blocks.
pub use crate::binning::{BinEdgePolicy, Binner, BinnerOptions};
pub use crate::error::{MaskError, Result};
pub use crate::geometry::{Geometry, PoniGeometry, RadialGeometry};
pub use crate::image::{ImageF32, Mask};
pub use crate::types::ImageShape;

// Diagnostics returned by `AutoMasker::process_with_diagnostics`.
pub use crate::diagnostics::{MaskReport, MaskTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use auto_mask::prelude::*;
///
/// # fn main() -> auto_mask::Result<()> {
/// let (w, h) = (256usize, 256usize);
/// let image = ImageF32::filled(w, h, 100.0);
/// let geometry = RadialGeometry::centered(image.shape());
///
/// let masker = AutoMasker::new(&geometry, image.shape(), AutoMaskParams::default())?;
/// let report = masker.process_with_diagnostics(&image, None)?;
/// println!("{}", report.text_summary());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::geometry::{Geometry, PoniGeometry, RadialGeometry};
    pub use crate::image::{ImageF32, Mask};
    pub use crate::{auto_mask, AutoMaskParams, AutoMasker, BinnerOptions, MaskError};
}
