//! Parameters of the auto-masking pipeline.
//!
//! Every option is explicit and has an immutable default; a params value is
//! passed into each pipeline call, nothing is read from process-wide state.
//!
//! Defaults reproduce plain sigma clipping: `alpha = 3`, at most 5 rounds, bins
//! need 2 valid pixels to have an opinion, deviations measured from the bin
//! mean, no border margin and no intensity thresholds.
//!
//! Binners built by the pipeline merge sparse rings until each holds
//! [`AutoMaskParams::flaggable_bin_size`] pixels: a lone outlier among `n`
//! equal pixels scores exactly `sqrt(n - 1)` standard deviations.

use crate::binning::BinnerOptions;
use crate::error::{MaskError, Result};
use crate::stats::CenterStatistic;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALPHA: f64 = 3.0;
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_MIN_BIN_PIXELS: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoMaskParams {
    /// Sigma-clipping threshold: a pixel is flagged when it deviates from its
    /// bin centre by more than `alpha` bin standard deviations.
    pub alpha: f64,
    /// Cap on refinement rounds; the loop always halts after this many.
    pub max_iterations: usize,
    /// Bins with fewer valid pixels do not flag anything in that round.
    pub min_bin_pixels: usize,
    /// Statistic the deviation is measured from.
    pub center: CenterStatistic,
    /// Pixels closer than this to the image border are masked up front.
    pub edge_margin: usize,
    /// Pixels with intensity below this value are masked up front.
    pub lower_threshold: Option<f32>,
    /// Pixels with intensity above this value are masked up front.
    pub upper_threshold: Option<f32>,
    /// Ring resolution.
    pub binning: BinnerOptions,
}

impl Default for AutoMaskParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            min_bin_pixels: DEFAULT_MIN_BIN_PIXELS,
            center: CenterStatistic::Mean,
            edge_margin: 0,
            lower_threshold: None,
            upper_threshold: None,
            binning: BinnerOptions::default(),
        }
    }
}

impl AutoMaskParams {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_binning(mut self, binning: BinnerOptions) -> Self {
        self.binning = binning;
        self
    }

    /// Smallest bin in which a single outlier can exceed `alpha`.
    ///
    /// With population statistics one pixel among `n` deviates by at most
    /// `sqrt(n - 1)` standard deviations, so bins need `n > alpha² + 1`.
    pub fn flaggable_bin_size(&self) -> usize {
        ((self.alpha * self.alpha).floor() as usize)
            .saturating_add(2)
            .max(self.min_bin_pixels)
    }

    /// Binning options used by the pipeline: `binning` with sparse bins merged
    /// up to [`AutoMaskParams::flaggable_bin_size`].
    pub fn binner_options(&self) -> BinnerOptions {
        let floor = self.flaggable_bin_size();
        let mut options = self.binning.clone();
        options.min_pixels_per_bin = options.min_pixels_per_bin.max(floor);
        options
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(MaskError::Config(format!(
                "alpha must be positive and finite, got {}",
                self.alpha
            )));
        }
        if self.max_iterations == 0 {
            return Err(MaskError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.min_bin_pixels == 0 {
            return Err(MaskError::Config(
                "min_bin_pixels must be at least 1".to_string(),
            ));
        }
        for (name, t) in [
            ("lower_threshold", self.lower_threshold),
            ("upper_threshold", self.upper_threshold),
        ] {
            if t.is_some_and(f32::is_nan) {
                return Err(MaskError::Config(format!("{name} is NaN")));
            }
        }
        if let (Some(lo), Some(hi)) = (self.lower_threshold, self.upper_threshold) {
            if lo >= hi {
                return Err(MaskError::Config(format!(
                    "lower_threshold {lo} must be below upper_threshold {hi}"
                )));
            }
        }
        self.binning.validate()
    }
}
