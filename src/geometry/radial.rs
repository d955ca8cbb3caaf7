use super::{BeamStop, Geometry, PixelSample};
use crate::error::{MaskError, Result};
use crate::types::ImageShape;

/// Radial pixel distance from a beam centre, in pixels.
///
/// Rings of equal radius stand in for rings of equal scattering angle when no
/// calibration is available (flat, untilted detector).
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGeometry {
    pub center_x: f64,
    pub center_y: f64,
    pub shape: Option<ImageShape>,
    pub beam_stop: Option<BeamStop>,
}

impl RadialGeometry {
    pub fn new(center_x: f64, center_y: f64) -> Self {
        Self {
            center_x,
            center_y,
            shape: None,
            beam_stop: None,
        }
    }

    /// Beam centre at the middle of `shape`; the shape is enforced.
    pub fn centered(shape: ImageShape) -> Self {
        Self::new(
            (shape.w as f64 - 1.0) * 0.5,
            (shape.h as f64 - 1.0) * 0.5,
        )
        .with_shape(shape)
    }

    pub fn with_shape(mut self, shape: ImageShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_beam_stop(mut self, beam_stop: BeamStop) -> Self {
        self.beam_stop = Some(beam_stop);
        self
    }
}

impl Geometry for RadialGeometry {
    fn validate_shape(&self, shape: ImageShape) -> Result<()> {
        if !(self.center_x.is_finite() && self.center_y.is_finite()) {
            return Err(MaskError::Geometry(format!(
                "beam centre ({}, {}) is not finite",
                self.center_x, self.center_y
            )));
        }
        match self.shape {
            Some(expected) if expected != shape => Err(MaskError::Geometry(format!(
                "geometry describes a {expected} detector, image is {shape}"
            ))),
            _ => Ok(()),
        }
    }

    fn sample(&self, col: usize, row: usize) -> Option<PixelSample> {
        if self.beam_stop.is_some_and(|b| b.covers(col, row)) {
            return None;
        }
        let r = (col as f64 - self.center_x).hypot(row as f64 - self.center_y);
        Some(PixelSample {
            value: r,
            radius: r,
        })
    }

    fn radial_resolution(&self) -> f64 {
        std::f64::consts::SQRT_2
    }
}
