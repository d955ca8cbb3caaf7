//! Error type shared by every stage of the masking engine.
//!
//! Errors are always returned to the caller of the failing operation; the
//! engine never logs-and-continues and never falls back to a partial mask.
use crate::types::ImageShape;

pub type Result<T> = std::result::Result<T, MaskError>;

#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    /// Image, exclusion set, user mask and binner disagree in shape.
    #[error("shape mismatch: {what} is {found}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: ImageShape,
        found: ImageShape,
    },

    /// The geometry cannot produce valid coordinates for the requested shape.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Invalid masking or binning parameters.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Input pixel data cannot be converted into the canonical representation.
    #[error("cannot convert pixel data: {0}")]
    TypeConversion(String),

    /// File-level failure in the I/O wrapper (image, poni, mask, config).
    #[error("{0}")]
    Io(String),
}

impl MaskError {
    pub(crate) fn shape_mismatch(
        what: &'static str,
        expected: ImageShape,
        found: ImageShape,
    ) -> Self {
        MaskError::ShapeMismatch {
            what,
            expected,
            found,
        }
    }

    /// Fails with [`MaskError::ShapeMismatch`] unless `found == expected`.
    pub(crate) fn ensure_shape(
        what: &'static str,
        expected: ImageShape,
        found: ImageShape,
    ) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::shape_mismatch(what, expected, found))
        }
    }
}
