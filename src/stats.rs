//! Per-bin intensity statistics over the pixels not yet excluded.
//!
//! One pass accumulates counts and sums per bin, a second pass accumulates
//! squared deviations from the bin mean (two-pass variance, population
//! normalisation). Medians are only computed when requested, by bucketing the
//! valid values of every bin into one flat buffer.
use crate::binning::{Binner, UNBINNED};
use crate::error::{MaskError, Result};
use crate::image::ImageF32;
use crate::masking::ExclusionSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Statistic a pixel's deviation is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterStatistic {
    #[default]
    Mean,
    Median,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Only present when the median was requested.
    pub median: Option<f64>,
}

/// Statistics of one bin. `moments` is `None` exactly when `count == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BinStat {
    pub count: usize,
    pub moments: Option<Moments>,
}

impl BinStat {
    /// Centre and spread usable for outlier decisions, or `None` when the bin
    /// has fewer than `min_pixels` valid pixels ("no opinion").
    pub fn center_and_std(&self, center: CenterStatistic, min_pixels: usize) -> Option<(f64, f64)> {
        if self.count < min_pixels {
            return None;
        }
        let m = self.moments?;
        let c = match center {
            CenterStatistic::Mean => m.mean,
            CenterStatistic::Median => m.median?,
        };
        Some((c, m.std))
    }
}

#[derive(Clone, Debug)]
pub struct BinStats {
    bins: Vec<BinStat>,
}

impl BinStats {
    /// Mean/std/count per bin over binned, non-excluded, finite pixels.
    pub fn compute(image: &ImageF32, binner: &Binner, exclusion: &ExclusionSet) -> Result<Self> {
        Self::compute_with(image, binner, exclusion, CenterStatistic::Mean)
    }

    /// As [`BinStats::compute`], additionally filling medians for
    /// [`CenterStatistic::Median`].
    pub fn compute_with(
        image: &ImageF32,
        binner: &Binner,
        exclusion: &ExclusionSet,
        center: CenterStatistic,
    ) -> Result<Self> {
        MaskError::ensure_shape("image", binner.shape(), image.shape())?;
        MaskError::ensure_shape("exclusion set", binner.shape(), exclusion.shape())?;

        let k = binner.bin_count();
        let pixels = image.pixels();
        let excluded = exclusion.as_slice();
        let indices = binner.indices();
        let valid = |i: usize| -> Option<(usize, f64)> {
            let bin = indices[i];
            let v = pixels[i];
            (bin != UNBINNED && !excluded[i] && v.is_finite()).then_some((bin as usize, v as f64))
        };

        let mut counts = vec![0usize; k];
        let mut sums = vec![0.0f64; k];
        for i in 0..pixels.len() {
            if let Some((bin, v)) = valid(i) {
                counts[bin] += 1;
                sums[bin] += v;
            }
        }
        let means: Vec<f64> = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
            .collect();

        let mut sq_dev = vec![0.0f64; k];
        for i in 0..pixels.len() {
            if let Some((bin, v)) = valid(i) {
                let d = v - means[bin];
                sq_dev[bin] += d * d;
            }
        }

        let medians = match center {
            CenterStatistic::Mean => None,
            CenterStatistic::Median => Some(bin_medians(&counts, pixels.len(), valid)),
        };

        let bins = (0..k)
            .map(|b| {
                let count = counts[b];
                let moments = (count > 0).then(|| Moments {
                    mean: means[b],
                    std: (sq_dev[b] / count as f64).sqrt(),
                    median: medians.as_ref().map(|m| m[b]),
                });
                BinStat { count, moments }
            })
            .collect();
        Ok(Self { bins })
    }

    #[inline]
    pub fn get(&self, bin: usize) -> &BinStat {
        &self.bins[bin]
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BinStat> {
        self.bins.iter()
    }
}

/// Median per bin via counting-sort bucketing and `select_nth_unstable`.
fn bin_medians<F>(counts: &[usize], n: usize, valid: F) -> Vec<f64>
where
    F: Fn(usize) -> Option<(usize, f64)>,
{
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    offsets.push(0usize);
    for &c in counts {
        offsets.push(offsets[offsets.len() - 1] + c);
    }
    let mut cursor = offsets.clone();
    let mut values = vec![0.0f64; offsets[counts.len()]];
    for i in 0..n {
        if let Some((bin, v)) = valid(i) {
            values[cursor[bin]] = v;
            cursor[bin] += 1;
        }
    }
    (0..counts.len())
        .map(|b| median_in_place(&mut values[offsets[b]..offsets[b + 1]]))
        .collect()
}

fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let cmp = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal);
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, cmp);
    let upper = *upper;
    if n % 2 == 1 {
        return upper;
    }
    let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    0.5 * (below + upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BinnerOptions;
    use crate::geometry::RadialGeometry;
    use crate::types::ImageShape;

    /// 1-row image with a geometry whose radius equals the column index.
    fn strip(values: &[f32], bins: usize) -> (ImageF32, Binner) {
        let shape = ImageShape::new(values.len(), 1);
        let geo = RadialGeometry::new(0.0, 0.0);
        let binner = Binner::build(&geo, shape, &BinnerOptions::uniform(bins)).unwrap();
        let image = ImageF32::from_vec(shape.w, 1, values.to_vec()).unwrap();
        (image, binner)
    }

    #[test]
    fn mean_and_population_std_per_bin() {
        let (image, binner) = strip(&[1.0, 3.0, 10.0, 10.0], 2);
        let empty = ExclusionSet::empty(image.shape());
        let stats = BinStats::compute(&image, &binner, &empty).unwrap();
        assert_eq!(stats.len(), 2);
        let b0 = stats.get(0).moments.unwrap();
        assert_eq!(stats.get(0).count, 2);
        assert_eq!(b0.mean, 2.0);
        assert_eq!(b0.std, 1.0);
        let b1 = stats.get(1).moments.unwrap();
        assert_eq!(b1.mean, 10.0);
        assert_eq!(b1.std, 0.0);
    }

    #[test]
    fn excluded_pixels_do_not_contribute() {
        let (image, binner) = strip(&[1.0, 3.0, 10.0, 10.0], 2);
        let mut exclusion = ExclusionSet::empty(image.shape());
        exclusion.insert(1);
        let stats = BinStats::compute(&image, &binner, &exclusion).unwrap();
        assert_eq!(stats.get(0).count, 1);
        assert_eq!(stats.get(0).moments.unwrap().mean, 1.0);
    }

    #[test]
    fn empty_bin_has_no_moments() {
        let (image, binner) = strip(&[1.0, 3.0, 10.0, 10.0], 2);
        let mut exclusion = ExclusionSet::empty(image.shape());
        exclusion.insert(2);
        exclusion.insert(3);
        let stats = BinStats::compute(&image, &binner, &exclusion).unwrap();
        assert_eq!(stats.get(1).count, 0);
        assert!(stats.get(1).moments.is_none());
        assert!(stats.get(1).center_and_std(CenterStatistic::Mean, 1).is_none());
        assert_eq!(stats.get(0).count, 2);
    }

    #[test]
    fn min_pixels_gate_hides_small_bins() {
        let (image, binner) = strip(&[1.0, 3.0, 10.0, 10.0], 2);
        let empty = ExclusionSet::empty(image.shape());
        let stats = BinStats::compute(&image, &binner, &empty).unwrap();
        assert!(stats.get(0).center_and_std(CenterStatistic::Mean, 2).is_some());
        assert!(stats.get(0).center_and_std(CenterStatistic::Mean, 3).is_none());
    }

    #[test]
    fn median_is_computed_on_request() {
        let (image, binner) = strip(&[5.0, 1.0, 100.0, 2.0, 7.0, 7.0, 8.0, 9.0], 2);
        let stats = BinStats::compute_with(
            &image,
            &binner,
            &ExclusionSet::empty(image.shape()),
            CenterStatistic::Median,
        )
        .unwrap();
        assert_eq!(stats.get(0).moments.unwrap().median, Some(3.5));
        assert_eq!(stats.get(1).moments.unwrap().median, Some(7.5));
        let empty = ExclusionSet::empty(image.shape());
        let plain = BinStats::compute(&image, &binner, &empty).unwrap();
        assert_eq!(plain.get(0).moments.unwrap().median, None);
    }

    #[test]
    fn non_finite_pixels_are_skipped() {
        let (image, binner) = strip(&[1.0, f32::NAN, 3.0, 3.0], 2);
        let empty = ExclusionSet::empty(image.shape());
        let stats = BinStats::compute(&image, &binner, &empty).unwrap();
        assert_eq!(stats.get(0).count, 1);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let (image, binner) = strip(&[1.0, 2.0, 3.0, 4.0], 2);
        let err = BinStats::compute(&image, &binner, &ExclusionSet::empty(ImageShape::new(3, 1)))
            .unwrap_err();
        assert!(matches!(err, MaskError::ShapeMismatch { .. }));
        let other = ImageF32::new(4, 2);
        let empty = ExclusionSet::empty(other.shape());
        let err = BinStats::compute(&other, &binner, &empty).unwrap_err();
        assert!(matches!(err, MaskError::ShapeMismatch { .. }));
    }
}
