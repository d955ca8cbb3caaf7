//! Calibrated detector geometry in the PONI convention.
//!
//! Axis 1 runs along image rows (y), axis 2 along columns (x), axis 3 along
//! the beam. The point of normal incidence (PONI) sits at (`poni1`, `poni2`)
//! metres from the detector origin, `distance` metres from the sample. Three
//! rotations tilt the detector; with all rotations zero the scattering angle
//! reduces to `atan(hypot(p1, p2) / distance)`.
//!
//! `.poni` files (versions 1 and 2) are parsed by [`PoniGeometry::from_poni_str`].
use super::detector::DetectorModel;
use super::units::ScatteringUnit;
use super::{BeamStop, Geometry, PixelSample};
use crate::error::{MaskError, Result};
use crate::types::ImageShape;
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct PoniGeometry {
    distance: f64,
    poni1: f64,
    poni2: f64,
    rotations: [f64; 3],
    wavelength: Option<f64>,
    pixel1: f64,
    pixel2: f64,
    shape: Option<ImageShape>,
    detector: Option<DetectorModel>,
    beam_stop: Option<BeamStop>,
    unit: ScatteringUnit,
    frame: Matrix3<f64>,
}

impl PoniGeometry {
    /// Untilted geometry with the PONI at the detector origin.
    pub fn new(distance: f64, pixel1: f64, pixel2: f64, wavelength: f64) -> Self {
        Self {
            distance,
            poni1: 0.0,
            poni2: 0.0,
            rotations: [0.0; 3],
            wavelength: Some(wavelength),
            pixel1,
            pixel2,
            shape: None,
            detector: None,
            beam_stop: None,
            unit: ScatteringUnit::default(),
            frame: Matrix3::identity(),
        }
    }

    /// Geometry for a catalogued detector: pixel size and shape come from the model.
    pub fn for_detector(model: DetectorModel, distance: f64, wavelength: f64) -> Self {
        let (pixel1, pixel2) = model.pixel_size();
        Self::new(distance, pixel1, pixel2, wavelength).with_detector(model)
    }

    pub fn with_poni(mut self, poni1: f64, poni2: f64) -> Self {
        self.poni1 = poni1;
        self.poni2 = poni2;
        self
    }

    pub fn with_rotations(mut self, rot1: f64, rot2: f64, rot3: f64) -> Self {
        self.rotations = [rot1, rot2, rot3];
        self.frame = detector_frame(rot1, rot2, rot3);
        self
    }

    pub fn with_shape(mut self, shape: ImageShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Attach a detector model; its module gaps become invalid coordinates and
    /// its shape is enforced unless a shape was set explicitly.
    pub fn with_detector(mut self, model: DetectorModel) -> Self {
        self.detector = Some(model);
        if self.shape.is_none() {
            self.shape = Some(model.shape());
        }
        self
    }

    pub fn with_beam_stop(mut self, beam_stop: BeamStop) -> Self {
        self.beam_stop = Some(beam_stop);
        self
    }

    pub fn with_unit(mut self, unit: ScatteringUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn poni(&self) -> (f64, f64) {
        (self.poni1, self.poni2)
    }

    pub fn rotations(&self) -> [f64; 3] {
        self.rotations
    }

    pub fn wavelength(&self) -> Option<f64> {
        self.wavelength
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.pixel1, self.pixel2)
    }

    pub fn shape(&self) -> Option<ImageShape> {
        self.shape
    }

    pub fn detector(&self) -> Option<DetectorModel> {
        self.detector
    }

    pub fn unit(&self) -> ScatteringUnit {
        self.unit
    }

    /// Scattering angle 2θ (radians) and in-plane radius (metres) at a pixel centre.
    pub fn two_theta(&self, col: usize, row: usize) -> (f64, f64) {
        let p1 = (row as f64 + 0.5) * self.pixel1 - self.poni1;
        let p2 = (col as f64 + 0.5) * self.pixel2 - self.poni2;
        let t: Vector3<f64> = self.frame * Vector3::new(p1, p2, self.distance);
        let radius = t.x.hypot(t.y);
        (radius.atan2(t.z), radius)
    }

    /// Parse the text of a `.poni` file.
    pub fn from_poni_str(text: &str) -> Result<Self> {
        PoniFields::parse(text)?.into_geometry()
    }

    fn check_parameters(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(MaskError::Geometry(format!(
                    "{name} must be positive and finite, got {v}"
                )))
            }
        };
        positive("distance", self.distance)?;
        positive("pixel1", self.pixel1)?;
        positive("pixel2", self.pixel2)?;
        if self.unit.needs_wavelength() {
            match self.wavelength {
                Some(w) => positive("wavelength", w)?,
                None => {
                    return Err(MaskError::Geometry(format!(
                        "unit {} requires a wavelength",
                        self.unit
                    )))
                }
            }
        }
        let finite = [self.poni1, self.poni2]
            .iter()
            .chain(self.rotations.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(MaskError::Geometry(
                "PONI offsets and rotations must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Geometry for PoniGeometry {
    fn validate_shape(&self, shape: ImageShape) -> Result<()> {
        self.check_parameters()?;
        if let Some(expected) = self.shape {
            if expected != shape {
                return Err(MaskError::Geometry(format!(
                    "geometry describes a {expected} detector, image is {shape}"
                )));
            }
        }
        Ok(())
    }

    fn sample(&self, col: usize, row: usize) -> Option<PixelSample> {
        if self.detector.is_some_and(|d| d.is_gap(col, row)) {
            return None;
        }
        if self.beam_stop.is_some_and(|b| b.covers(col, row)) {
            return None;
        }
        let (tth, radius) = self.two_theta(col, row);
        let wavelength = self.wavelength.unwrap_or(f64::NAN);
        Some(PixelSample {
            value: self.unit.from_two_theta(tth, wavelength, radius),
            radius,
        })
    }

    fn radial_resolution(&self) -> f64 {
        self.pixel1.hypot(self.pixel2)
    }
}

/// Maps detector-plane coordinates (p1, p2, L) into the lab frame for the
/// rotation sequence rot1 → rot2 → rot3.
fn detector_frame(rot1: f64, rot2: f64, rot3: f64) -> Matrix3<f64> {
    let (s1, c1) = rot1.sin_cos();
    let (s2, c2) = rot2.sin_cos();
    let (s3, c3) = rot3.sin_cos();
    Matrix3::new(
        c2 * c3,
        c3 * s1 * s2 - c1 * s3,
        -(c1 * c3 * s2 + s1 * s3),
        c2 * s3,
        c1 * c3 + s1 * s2 * s3,
        c3 * s1 - c1 * s2 * s3,
        s2,
        -c2 * s1,
        c1 * c2,
    )
}

/// Load and parse a `.poni` file.
pub fn load_poni(path: &Path) -> Result<PoniGeometry> {
    let text = fs::read_to_string(path)
        .map_err(|e| MaskError::Io(format!("Failed to read poni {}: {e}", path.display())))?;
    PoniGeometry::from_poni_str(&text).map_err(|e| match e {
        MaskError::Geometry(msg) => MaskError::Geometry(format!("{}: {msg}", path.display())),
        other => other,
    })
}

#[derive(Debug, Default, Deserialize)]
struct DetectorConfig {
    pixel1: Option<f64>,
    pixel2: Option<f64>,
    /// [rows, cols]
    max_shape: Option<[usize; 2]>,
}

#[derive(Debug, Default)]
struct PoniFields {
    distance: Option<f64>,
    poni1: f64,
    poni2: f64,
    rotations: [f64; 3],
    wavelength: Option<f64>,
    pixel1: Option<f64>,
    pixel2: Option<f64>,
    detector: Option<DetectorModel>,
    detector_config: DetectorConfig,
}

impl PoniFields {
    fn parse(text: &str) -> Result<Self> {
        let mut fields = PoniFields::default();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            let number = || {
                value.parse::<f64>().map_err(|e| {
                    MaskError::Geometry(format!(
                        "line {}: cannot parse {key} value {value:?}: {e}",
                        lineno + 1
                    ))
                })
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "distance" => fields.distance = Some(number()?),
                "poni1" => fields.poni1 = number()?,
                "poni2" => fields.poni2 = number()?,
                "rot1" => fields.rotations[0] = number()?,
                "rot2" => fields.rotations[1] = number()?,
                "rot3" => fields.rotations[2] = number()?,
                "wavelength" => fields.wavelength = Some(number()?),
                "pixelsize1" => fields.pixel1 = Some(number()?),
                "pixelsize2" => fields.pixel2 = Some(number()?),
                "detector" => fields.detector = DetectorModel::from_name(value),
                "detector_config" => {
                    fields.detector_config = serde_json::from_str(value).map_err(|e| {
                        MaskError::Geometry(format!(
                            "line {}: invalid Detector_config: {e}",
                            lineno + 1
                        ))
                    })?;
                }
                _ => {}
            }
        }
        Ok(fields)
    }

    fn into_geometry(self) -> Result<PoniGeometry> {
        let distance = self
            .distance
            .ok_or_else(|| MaskError::Geometry("missing Distance".to_string()))?;
        let catalogue = self.detector.map(DetectorModel::pixel_size);
        let pixel1 = self
            .detector_config
            .pixel1
            .or(self.pixel1)
            .or(catalogue.map(|p| p.0))
            .ok_or_else(|| MaskError::Geometry("missing pixel size (axis 1)".to_string()))?;
        let pixel2 = self
            .detector_config
            .pixel2
            .or(self.pixel2)
            .or(catalogue.map(|p| p.1))
            .ok_or_else(|| MaskError::Geometry("missing pixel size (axis 2)".to_string()))?;

        let mut geometry = PoniGeometry::new(distance, pixel1, pixel2, f64::NAN)
            .with_poni(self.poni1, self.poni2)
            .with_rotations(self.rotations[0], self.rotations[1], self.rotations[2]);
        geometry.wavelength = self.wavelength;
        if let Some([rows, cols]) = self.detector_config.max_shape {
            geometry = geometry.with_shape(ImageShape::new(cols, rows));
        }
        if let Some(model) = self.detector {
            geometry = geometry.with_detector(model);
        }
        Ok(geometry)
    }
}
