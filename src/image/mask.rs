//! Boolean pixel mask: `true` marks a pixel excluded from downstream use.
//!
//! This is the externally visible type for both the engine output and the
//! optional user mask. The integer view (`to_u8`) uses 1 = masked, 0 = good.
use crate::error::{MaskError, Result};
use crate::types::ImageShape;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    w: usize,
    h: usize,
    data: Vec<bool>,
}

impl Mask {
    /// All-good mask (nothing masked).
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![false; w * h],
        }
    }

    pub fn from_bools(w: usize, h: usize, data: Vec<bool>) -> Result<Self> {
        if data.len() != w * h {
            return Err(MaskError::TypeConversion(format!(
                "mask buffer of {} values cannot form a {w}x{h} mask",
                data.len()
            )));
        }
        Ok(Self { w, h, data })
    }

    pub(crate) fn from_parts(shape: ImageShape, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), shape.len());
        Self {
            w: shape.w,
            h: shape.h,
            data,
        }
    }

    /// Integer mask conversion: any non-zero value is masked.
    pub fn from_u8(w: usize, h: usize, values: &[u8]) -> Result<Self> {
        Self::from_bools(w, h, values.iter().map(|&v| v != 0).collect())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.w, self.h)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, masked: bool) {
        self.data[y * self.w + x] = masked;
    }

    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Number of masked pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }

    /// 0/1 integer representation, 1 = masked.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data.iter().map(|&m| m as u8).collect()
    }

    /// True when every pixel masked in `other` is also masked here.
    pub fn contains(&self, other: &Mask) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(&mine, &theirs)| mine || !theirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_treats_nonzero_as_masked() {
        let mask = Mask::from_u8(3, 1, &[0, 1, 255]).unwrap();
        assert_eq!(mask.to_u8(), vec![0, 1, 1]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn from_bools_rejects_wrong_length() {
        let err = Mask::from_bools(2, 2, vec![false; 3]).unwrap_err();
        assert!(matches!(err, MaskError::TypeConversion(_)));
    }

    #[test]
    fn contains_checks_superset() {
        let mut big = Mask::new(2, 2);
        big.set(0, 0, true);
        big.set(1, 1, true);
        let mut small = Mask::new(2, 2);
        small.set(1, 1, true);
        assert!(big.contains(&small));
        assert!(!small.contains(&big));
    }

    #[test]
    fn dimensions_always_describe_the_buffer() {
        let mask = Mask::from_u8(4, 3, &[1; 12]).unwrap();
        assert_eq!((mask.width(), mask.height()), (4, 3));
        assert_eq!(mask.as_slice().len(), mask.width() * mask.height());
        assert_eq!(mask.to_u8().len(), mask.shape().len());
        assert_eq!(mask.count(), 12);
    }
}
