//! Owned single-channel f32 intensity image in contiguous row-major layout.
//!
//! This is the one canonical pixel representation the masking engine accepts.
//! Other containers are adapted through the explicit constructors below, which
//! report [`MaskError::TypeConversion`] when the data cannot be interpreted.
use crate::error::{MaskError, Result};
use crate::types::ImageShape;
use image::DynamicImage;

#[derive(Clone, Debug)]
pub struct ImageF32 {
    w: usize,
    h: usize,
    data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    /// Construct a buffer of size `w × h` with every pixel set to `value`.
    pub fn filled(w: usize, h: usize, value: f32) -> Self {
        Self {
            w,
            h,
            data: vec![value; w * h],
        }
    }

    /// Wrap a row-major buffer. The length must be exactly `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != w * h {
            return Err(MaskError::TypeConversion(format!(
                "buffer of {} values cannot form a {w}x{h} image",
                data.len()
            )));
        }
        Ok(Self { w, h, data })
    }

    /// Convert raw 16-bit detector counts.
    pub fn from_u16(w: usize, h: usize, counts: &[u16]) -> Result<Self> {
        Self::from_vec(w, h, counts.iter().map(|&c| c as f32).collect())
    }

    /// Convert 64-bit floats, rejecting values that overflow f32.
    pub fn from_f64(w: usize, h: usize, values: &[f64]) -> Result<Self> {
        let mut data = Vec::with_capacity(values.len());
        for (i, &v) in values.iter().enumerate() {
            let narrowed = v as f32;
            if v.is_finite() && !narrowed.is_finite() {
                return Err(MaskError::TypeConversion(format!(
                    "value {v} at index {i} does not fit in f32"
                )));
            }
            data.push(narrowed);
        }
        Self::from_vec(w, h, data)
    }

    /// Image width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    /// Image height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.w, self.h)
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Contiguous pixel values in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

/// 8- and 16-bit grayscale keep their raw counts; every other layout is
/// reduced to luminance through `to_luma32f`.
impl TryFrom<DynamicImage> for ImageF32 {
    type Error = MaskError;

    fn try_from(img: DynamicImage) -> Result<Self> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        match img {
            DynamicImage::ImageLuma8(buf) => {
                Self::from_vec(w, h, buf.into_raw().into_iter().map(f32::from).collect())
            }
            DynamicImage::ImageLuma16(buf) => Self::from_u16(w, h, buf.as_raw()),
            other => Self::from_vec(w, h, other.to_luma32f().into_raw()),
        }
    }
}
