//! Options controlling how the binning quantity is partitioned into rings.
use crate::error::{MaskError, Result};
use serde::{Deserialize, Serialize};

/// Default number of uniform bins. Matches the point count used for 1D
/// integration of the same images, so rings line up with integrated curves.
pub const DEFAULT_BIN_COUNT: usize = 3000;

/// How bin boundaries are laid out over the quantity range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BinEdgePolicy {
    /// `count` equal-width bins spanning the observed (or configured) range.
    Uniform { count: usize },
    /// Ring width of half a pixel diagonal: edges sit at the largest quantity
    /// reached within each radial step of `radial_resolution / 2`.
    PixelResolution,
}

impl Default for BinEdgePolicy {
    fn default() -> Self {
        BinEdgePolicy::Uniform {
            count: DEFAULT_BIN_COUNT,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinnerOptions {
    pub policy: BinEdgePolicy,
    /// Inclusive quantity range to bin; pixels outside are left unbinned.
    /// `None` bins the full observed range.
    pub range: Option<(f64, f64)>,
    /// Adjacent bins holding fewer binned pixels than this are merged.
    /// `0` and `1` keep the policy's edges as they are.
    pub min_pixels_per_bin: usize,
}

impl BinnerOptions {
    pub fn uniform(count: usize) -> Self {
        Self {
            policy: BinEdgePolicy::Uniform { count },
            ..Default::default()
        }
    }

    pub fn pixel_resolution() -> Self {
        Self {
            policy: BinEdgePolicy::PixelResolution,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, lo: f64, hi: f64) -> Self {
        self.range = Some((lo, hi));
        self
    }

    pub fn with_min_pixels_per_bin(mut self, min_pixels: usize) -> Self {
        self.min_pixels_per_bin = min_pixels;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let BinEdgePolicy::Uniform { count: 0 } = self.policy {
            return Err(MaskError::Config(
                "bin count must be positive".to_string(),
            ));
        }
        if let Some((lo, hi)) = self.range {
            if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
                return Err(MaskError::Config(format!(
                    "binning range [{lo}, {hi}] must be finite and non-empty"
                )));
            }
        }
        Ok(())
    }
}
