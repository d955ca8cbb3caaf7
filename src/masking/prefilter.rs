//! Seeds the exclusion set before sigma clipping.
//!
//! The user mask, a border margin, intensity thresholds and non-finite binned
//! pixels are excluded once up front. Everything excluded here also ends up
//! in the final mask.
use super::exclusion::ExclusionSet;
use super::params::AutoMaskParams;
use crate::binning::{Binner, UNBINNED};
use crate::diagnostics::PrefilterStage;
use crate::error::{MaskError, Result};
use crate::image::{ImageF32, Mask};

pub fn seed_exclusion(
    image: &ImageF32,
    binner: &Binner,
    user_mask: Option<&Mask>,
    params: &AutoMaskParams,
) -> Result<(ExclusionSet, PrefilterStage)> {
    let shape = binner.shape();
    MaskError::ensure_shape("image", shape, image.shape())?;

    let mut stage = PrefilterStage::default();
    let mut exclusion = match user_mask {
        Some(mask) => {
            MaskError::ensure_shape("user mask", shape, mask.shape())?;
            let seeded = ExclusionSet::from_mask(mask);
            stage.user_masked = seeded.len();
            seeded
        }
        None => ExclusionSet::empty(shape),
    };

    let margin = params.edge_margin;
    if margin > 0 {
        for y in 0..shape.h {
            for x in 0..shape.w {
                let near_border =
                    x < margin || y < margin || x + margin >= shape.w || y + margin >= shape.h;
                if near_border && exclusion.insert(shape.idx(x, y)) {
                    stage.edge_masked += 1;
                }
            }
        }
    }

    let (lower, upper) = (params.lower_threshold, params.upper_threshold);
    if lower.is_some() || upper.is_some() {
        for (i, &v) in image.pixels().iter().enumerate() {
            let out = lower.is_some_and(|lo| v < lo) || upper.is_some_and(|hi| v > hi);
            if out && exclusion.insert(i) {
                stage.threshold_masked += 1;
            }
        }
    }

    for (i, (&v, &bin)) in image.pixels().iter().zip(binner.indices()).enumerate() {
        if bin != UNBINNED && !v.is_finite() && exclusion.insert(i) {
            stage.non_finite += 1;
        }
    }

    Ok((exclusion, stage))
}
