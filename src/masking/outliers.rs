//! Iterative per-bin sigma clipping.
//!
//! Each round is a pure function of the current exclusion set
//! ([`OutlierMasker::step`]): bin statistics are recomputed without the
//! excluded pixels, and every binned, non-excluded pixel whose deviation from
//! its bin centre exceeds `alpha` bin standard deviations is flagged. The
//! driver ([`OutlierMasker::run`]) unions the flags into the exclusion set and
//! repeats until a round flags nothing or `max_iterations` rounds ran.
//!
//! Key rules
//! - Bins with fewer than `min_bin_pixels` valid pixels have no opinion.
//! - A zero standard deviation makes any differing pixel an infinite outlier;
//!   a pixel equal to the bin centre is never flagged.
//! - Unbinned pixels are never evaluated, so never flagged.
use super::exclusion::ExclusionSet;
use super::params::AutoMaskParams;
use crate::binning::{Binner, UNBINNED};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::RefinementIteration;
use crate::error::{MaskError, Result};
use crate::image::ImageF32;
use crate::stats::{BinStats, CenterStatistic};
use log::debug;
use std::time::Instant;

#[derive(Clone, Debug, PartialEq)]
pub struct OutlierMasker {
    alpha: f64,
    max_iterations: usize,
    min_bin_pixels: usize,
    center: CenterStatistic,
}

/// Outcome of one clipping round.
#[derive(Clone, Debug)]
pub struct RefineStep {
    /// Input exclusion set plus this round's flags.
    pub exclusion: ExclusionSet,
    /// Pixels flagged in this round.
    pub flagged: Vec<usize>,
    /// Bins that had enough valid pixels to take part.
    pub bins_evaluated: usize,
}

/// Outcome of a full clipping run.
#[derive(Clone, Debug)]
pub struct OutlierRun {
    pub exclusion: ExclusionSet,
    pub iterations: Vec<RefinementIteration>,
    /// True when the last round flagged nothing.
    pub converged: bool,
}

impl OutlierMasker {
    pub fn new(alpha: f64, max_iterations: usize) -> Result<Self> {
        let params = AutoMaskParams::default()
            .with_alpha(alpha)
            .with_max_iterations(max_iterations);
        Self::from_params(&params)
    }

    pub fn from_params(params: &AutoMaskParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            alpha: params.alpha,
            max_iterations: params.max_iterations,
            min_bin_pixels: params.min_bin_pixels,
            center: params.center,
        })
    }

    pub fn with_min_bin_pixels(mut self, min_bin_pixels: usize) -> Result<Self> {
        if min_bin_pixels == 0 {
            return Err(MaskError::Config(
                "min_bin_pixels must be at least 1".to_string(),
            ));
        }
        self.min_bin_pixels = min_bin_pixels;
        Ok(self)
    }

    pub fn with_center(mut self, center: CenterStatistic) -> Self {
        self.center = center;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// One clipping round against `exclusion`. Does not modify its input.
    pub fn step(
        &self,
        image: &ImageF32,
        binner: &Binner,
        exclusion: &ExclusionSet,
    ) -> Result<RefineStep> {
        let stats = BinStats::compute_with(image, binner, exclusion, self.center)?;
        let rule: Vec<Option<(f64, f64)>> = stats
            .iter()
            .map(|s| s.center_and_std(self.center, self.min_bin_pixels))
            .collect();
        let bins_evaluated = rule.iter().filter(|r| r.is_some()).count();

        let excluded = exclusion.as_slice();
        let flagged: Vec<usize> = image
            .pixels()
            .iter()
            .zip(binner.indices())
            .enumerate()
            .filter_map(|(i, (&v, &bin))| {
                if bin == UNBINNED || excluded[i] {
                    return None;
                }
                let (center, std) = rule[bin as usize]?;
                (deviation(v as f64, center, std) > self.alpha).then_some(i)
            })
            .collect();

        Ok(RefineStep {
            exclusion: exclusion.union_with(&flagged),
            flagged,
            bins_evaluated,
        })
    }

    /// Clip until a round flags nothing or `max_iterations` rounds ran.
    pub fn run(
        &self,
        image: &ImageF32,
        binner: &Binner,
        exclusion: ExclusionSet,
    ) -> Result<ExclusionSet> {
        Ok(self.run_traced(image, binner, exclusion)?.exclusion)
    }

    /// As [`OutlierMasker::run`], keeping one record per round.
    pub fn run_traced(
        &self,
        image: &ImageF32,
        binner: &Binner,
        mut exclusion: ExclusionSet,
    ) -> Result<OutlierRun> {
        let mut iterations = Vec::with_capacity(self.max_iterations);
        let mut converged = false;
        for iteration in 1..=self.max_iterations {
            let start = Instant::now();
            let step = self.step(image, binner, &exclusion)?;
            let elapsed_ms = elapsed_ms(start);
            let newly_flagged = step.flagged.len();
            exclusion = step.exclusion;
            debug!(
                "OutlierMasker iteration={} flagged={} excluded={} bins_evaluated={}",
                iteration,
                newly_flagged,
                exclusion.len(),
                step.bins_evaluated
            );
            iterations.push(RefinementIteration {
                iteration,
                newly_flagged,
                excluded_total: exclusion.len(),
                bins_evaluated: step.bins_evaluated,
                elapsed_ms,
            });
            if newly_flagged == 0 {
                converged = true;
                break;
            }
        }
        Ok(OutlierRun {
            exclusion,
            iterations,
            converged,
        })
    }
}

/// |v - center| in units of `std`; infinite for any difference when `std == 0`.
#[inline]
fn deviation(v: f64, center: f64, std: f64) -> f64 {
    let d = (v - center).abs();
    if std > 0.0 {
        d / std
    } else if d == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BinnerOptions;
    use crate::geometry::RadialGeometry;
    use crate::types::ImageShape;

    /// One-row image binned into a single ring.
    fn single_bin(values: &[f32]) -> (ImageF32, Binner) {
        let shape = ImageShape::new(values.len(), 1);
        let binner =
            Binner::build(&RadialGeometry::new(0.0, 0.0), shape, &BinnerOptions::uniform(1))
                .unwrap();
        (ImageF32::from_vec(shape.w, 1, values.to_vec()).unwrap(), binner)
    }

    #[test]
    fn deviation_handles_zero_spread() {
        assert_eq!(deviation(5.0, 5.0, 0.0), 0.0);
        assert_eq!(deviation(5.1, 5.0, 0.0), f64::INFINITY);
        assert_eq!(deviation(7.0, 5.0, 1.0), 2.0);
    }

    #[test]
    fn step_flags_single_hot_pixel() {
        let mut values = vec![10.0f32; 20];
        values[7] = 1000.0;
        let (image, binner) = single_bin(&values);
        let masker = OutlierMasker::new(3.0, 5).unwrap();
        let step = masker
            .step(&image, &binner, &ExclusionSet::empty(image.shape()))
            .unwrap();
        assert_eq!(step.flagged, vec![7]);
        assert_eq!(step.bins_evaluated, 1);
        assert!(step.exclusion.contains(7));
    }

    #[test]
    fn step_does_not_touch_its_input() {
        let mut values = vec![1.0f32; 20];
        values[0] = 50.0;
        let (image, binner) = single_bin(&values);
        let masker = OutlierMasker::new(3.0, 5).unwrap();
        let before = ExclusionSet::empty(image.shape());
        let step = masker.step(&image, &binner, &before).unwrap();
        assert!(before.is_empty());
        assert_eq!(step.exclusion.len(), 1);
    }

    #[test]
    fn run_peels_nested_outliers_over_iterations() {
        // The 1e6 pixel inflates the std enough to hide the 200 pixel in the
        // first round; once excluded, the second round catches the 200.
        let mut values = vec![10.0f32; 30];
        values[3] = 1.0e6;
        values[11] = 200.0;
        let (image, binner) = single_bin(&values);
        let masker = OutlierMasker::new(3.0, 5).unwrap();
        let run = masker
            .run_traced(&image, &binner, ExclusionSet::empty(image.shape()))
            .unwrap();
        assert!(run.exclusion.contains(3));
        assert!(run.exclusion.contains(11));
        assert_eq!(run.exclusion.len(), 2);
        assert!(run.converged);
        assert_eq!(run.iterations.len(), 3);
        assert_eq!(run.iterations[0].newly_flagged, 1);
        assert_eq!(run.iterations[1].newly_flagged, 1);
        assert_eq!(run.iterations[2].newly_flagged, 0);
    }

    #[test]
    fn iteration_cap_bounds_the_loop() {
        let mut values = vec![10.0f32; 30];
        values[3] = 1.0e6;
        values[11] = 200.0;
        let (image, binner) = single_bin(&values);
        let masker = OutlierMasker::new(3.0, 1).unwrap();
        let run = masker
            .run_traced(&image, &binner, ExclusionSet::empty(image.shape()))
            .unwrap();
        assert_eq!(run.iterations.len(), 1);
        assert!(!run.converged);
        assert!(run.exclusion.contains(3));
        assert!(!run.exclusion.contains(11));
    }

    #[test]
    fn small_bins_have_no_opinion() {
        let mut values = vec![1.0f32; 10];
        values.push(900.0);
        let (image, binner) = single_bin(&values);
        let masker = OutlierMasker::new(3.0, 5)
            .unwrap()
            .with_min_bin_pixels(12)
            .unwrap();
        let excluded = masker
            .run(&image, &binner, ExclusionSet::empty(image.shape()))
            .unwrap();
        assert!(excluded.is_empty());
    }

    #[test]
    fn median_center_flags_the_same_hot_pixel() {
        let mut values = vec![4.0f32; 25];
        values[2] = 3.0;
        values[20] = 400.0;
        let (image, binner) = single_bin(&values);
        let masker = OutlierMasker::new(3.0, 5)
            .unwrap()
            .with_center(CenterStatistic::Median);
        let excluded = masker
            .run(&image, &binner, ExclusionSet::empty(image.shape()))
            .unwrap();
        assert!(excluded.contains(20));
    }

    #[test]
    fn invalid_alpha_is_a_config_error() {
        assert!(matches!(
            OutlierMasker::new(0.0, 5),
            Err(MaskError::Config(_))
        ));
    }
}
