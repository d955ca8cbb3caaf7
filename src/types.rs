use serde::{Deserialize, Serialize};
use std::fmt;

/// Width × height of a pixel grid. Shared by images, masks, exclusion sets and binners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    pub w: usize,
    pub h: usize,
}

impl ImageShape {
    pub fn new(w: usize, h: usize) -> Self {
        Self { w, h }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear row-major index of (x, y).
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}
