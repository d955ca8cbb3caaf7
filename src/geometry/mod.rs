//! Detector geometry: maps a pixel coordinate to the scalar physical quantity
//! used for binning.
//!
//! The binner only talks to the [`Geometry`] trait. Two descriptors ship with
//! the crate:
//! - [`PoniGeometry`] – calibrated distance/PONI/rotations/wavelength model,
//!   evaluating 2θ and derived units (Q, radius in mm). Loadable from `.poni`.
//! - [`RadialGeometry`] – plain radial pixel distance from a beam centre, for
//!   uncalibrated data and synthetic images.
//!
//! Invalid coordinates (detector gaps, beam-stop shadow) are reported by
//! returning `None` from [`Geometry::sample`]; the binner maps them to the
//! unbinned sentinel.

pub mod detector;
pub mod poni;
pub mod radial;
pub mod units;

pub use detector::DetectorModel;
pub use poni::{load_poni, PoniGeometry};
pub use radial::RadialGeometry;
pub use units::ScatteringUnit;

use crate::error::Result;
use crate::types::ImageShape;
use serde::{Deserialize, Serialize};

/// Quantity evaluated at one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelSample {
    /// Binning quantity in the geometry's unit.
    pub value: f64,
    /// In-plane distance to the direct-beam position, in the same length unit
    /// as [`Geometry::radial_resolution`].
    pub radius: f64,
}

/// Something able to evaluate a binning quantity for every pixel of an image.
pub trait Geometry: Send + Sync {
    /// Fails with [`MaskError::Geometry`](crate::MaskError::Geometry) when the
    /// descriptor cannot produce coordinates for `shape`.
    fn validate_shape(&self, shape: ImageShape) -> Result<()>;

    /// Quantity at pixel (`col`, `row`); `None` for invalid coordinates.
    fn sample(&self, col: usize, row: usize) -> Option<PixelSample>;

    /// Radial size of one pixel (its diagonal), used by
    /// [`BinEdgePolicy::PixelResolution`](crate::binning::BinEdgePolicy).
    fn radial_resolution(&self) -> f64;
}

/// Circular beam-stop shadow in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamStop {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl BeamStop {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    #[inline]
    pub fn covers(&self, col: usize, row: usize) -> bool {
        let dx = col as f64 - self.x;
        let dy = row as f64 - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}
