//! Auto-mask pipeline: binning, pre-filtering, sigma clipping and combination
//! with the user mask.
//!
//! Typical usage:
//! ```no_run
//! use auto_mask::{auto_mask, AutoMaskParams, ImageF32};
//! use auto_mask::geometry::RadialGeometry;
//!
//! # fn example(image: ImageF32) -> auto_mask::Result<()> {
//! let geometry = RadialGeometry::centered(image.shape());
//! let mask = auto_mask(&image, &geometry, None, &AutoMaskParams::default())?;
//! println!("masked {} pixels", mask.count());
//! # Ok(())
//! # }
//! ```
//!
//! For many images sharing one detector geometry, build an [`AutoMasker`]
//! once; it keeps the binner and reuses it for every frame.
use crate::binning::Binner;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{
    BinningStage, InputDescriptor, MaskReport, MaskSummary, MaskTrace, TimingBreakdown,
};
use crate::error::{MaskError, Result};
use crate::geometry::Geometry;
use crate::image::{ImageF32, Mask};
use crate::masking::{combine_masks, seed_exclusion, AutoMaskParams, OutlierMasker};
use crate::types::ImageShape;
use log::debug;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Compute the bad-pixel mask of `image`.
///
/// Parameters are validated before any geometry is evaluated; the binner is
/// built for `image.shape()` and discarded afterwards.
pub fn auto_mask<G: Geometry + ?Sized>(
    image: &ImageF32,
    geometry: &G,
    user_mask: Option<&Mask>,
    params: &AutoMaskParams,
) -> Result<Mask> {
    params.validate()?;
    let start = Instant::now();
    let binner = Binner::build(geometry, image.shape(), &params.binner_options())?;
    let binning_ms = elapsed_ms(start);
    Ok(run_pipeline(image, &binner, user_mask, params, binning_ms)?.mask)
}

/// As [`auto_mask`] with a prebuilt binner. `params.binning` is not used.
pub fn auto_mask_with_binner(
    image: &ImageF32,
    binner: &Binner,
    user_mask: Option<&Mask>,
    params: &AutoMaskParams,
) -> Result<Mask> {
    params.validate()?;
    Ok(run_pipeline(image, binner, user_mask, params, 0.0)?.mask)
}

/// Masks images of one detector geometry, reusing a single binner.
#[derive(Clone, Debug)]
pub struct AutoMasker {
    params: AutoMaskParams,
    binner: Arc<Binner>,
}

impl AutoMasker {
    /// Validate `params` and build the binner for `shape`.
    pub fn new<G: Geometry + ?Sized>(
        geometry: &G,
        shape: ImageShape,
        params: AutoMaskParams,
    ) -> Result<Self> {
        params.validate()?;
        let binner = Binner::build(geometry, shape, &params.binner_options())?;
        Ok(Self {
            params,
            binner: Arc::new(binner),
        })
    }

    /// Wrap an existing binner, e.g. one shared with other maskers.
    pub fn from_binner(binner: Arc<Binner>, params: AutoMaskParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, binner })
    }

    pub fn params(&self) -> &AutoMaskParams {
        &self.params
    }

    pub fn binner(&self) -> &Arc<Binner> {
        &self.binner
    }

    pub fn process(&self, image: &ImageF32, user_mask: Option<&Mask>) -> Result<Mask> {
        Ok(self.process_with_diagnostics(image, user_mask)?.mask)
    }

    /// Run the pipeline and return the mask with a full trace.
    pub fn process_with_diagnostics(
        &self,
        image: &ImageF32,
        user_mask: Option<&Mask>,
    ) -> Result<MaskReport> {
        run_pipeline(image, &self.binner, user_mask, &self.params, 0.0)
    }

    /// Mask every image independently; one result per input, in order.
    pub fn process_batch(
        &self,
        images: &[ImageF32],
        user_mask: Option<&Mask>,
    ) -> Vec<Result<Mask>> {
        debug!("AutoMasker::process_batch images={}", images.len());
        #[cfg(feature = "parallel")]
        {
            images
                .par_iter()
                .map(|image| self.process(image, user_mask))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            images
                .iter()
                .map(|image| self.process(image, user_mask))
                .collect()
        }
    }
}

/// Shared body of every entry point. `params` must already be validated.
pub(crate) fn run_pipeline(
    image: &ImageF32,
    binner: &Binner,
    user_mask: Option<&Mask>,
    params: &AutoMaskParams,
    binning_ms: f64,
) -> Result<MaskReport> {
    let total_start = Instant::now();
    let shape = image.shape();
    debug!(
        "AutoMasker::process start w={} h={} bins={} alpha={} max_iterations={}",
        shape.w,
        shape.h,
        binner.bin_count(),
        params.alpha,
        params.max_iterations
    );
    MaskError::ensure_shape("image", binner.shape(), shape)?;
    let masker = OutlierMasker::from_params(params)?;

    let mut timings = TimingBreakdown::default();
    timings.push("binning", binning_ms);

    let stage_start = Instant::now();
    let (seed, prefilter) = seed_exclusion(image, binner, user_mask, params)?;
    timings.record_since("prefilter", stage_start);

    let stage_start = Instant::now();
    let run = masker.run_traced(image, binner, seed)?;
    timings.record_since("sigma_clip", stage_start);

    let stage_start = Instant::now();
    let mask = combine_masks(&run.exclusion, user_mask)?;
    timings.record_since("combine", stage_start);
    timings.total_ms = binning_ms + elapsed_ms(total_start);

    let summary = MaskSummary::from_mask(&mask);
    debug!(
        "AutoMasker::process done masked={} prefiltered={} rounds={} converged={} total_ms={:.3}",
        summary.masked_pixels,
        prefilter.total(),
        run.iterations.len(),
        run.converged,
        timings.total_ms
    );

    Ok(MaskReport {
        mask,
        summary,
        trace: MaskTrace {
            input: InputDescriptor {
                width: shape.w,
                height: shape.h,
                alpha: params.alpha,
                max_iterations: params.max_iterations,
                user_mask: user_mask.is_some(),
            },
            binning: BinningStage::from_binner(binner, binning_ms),
            prefilter,
            iterations: run.iterations,
            converged: run.converged,
            timings,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BinnerOptions;
    use crate::geometry::RadialGeometry;

    fn params() -> AutoMaskParams {
        AutoMaskParams::default().with_binning(BinnerOptions::uniform(8))
    }

    fn flat(w: usize, h: usize) -> ImageF32 {
        ImageF32::filled(w, h, 100.0)
    }

    #[test]
    fn flat_image_yields_empty_mask() {
        let image = flat(32, 32);
        let geometry = RadialGeometry::centered(image.shape());
        let mask = auto_mask(&image, &geometry, None, &params()).unwrap();
        assert_eq!(mask.shape(), image.shape());
        assert_eq!(mask.count(), 0);
    }

    #[test]
    fn hot_pixel_is_reported_in_trace() {
        let mut image = flat(32, 32);
        image.set(20, 14, 10_000.0);
        let masker = AutoMasker::new(
            &RadialGeometry::centered(image.shape()),
            image.shape(),
            params(),
        )
        .unwrap();
        let report = masker.process_with_diagnostics(&image, None).unwrap();
        assert_eq!(report.mask.count(), 1);
        assert!(report.mask.get(20, 14));
        assert_eq!(report.summary.masked_pixels, 1);
        assert!(report.trace.converged);
        assert_eq!(report.trace.iterations[0].newly_flagged, 1);
        assert_eq!(report.trace.iterations.last().unwrap().newly_flagged, 0);
        assert_eq!(report.trace.binning.bin_count, 8);
        assert!(report.trace.timings.stage_ms("sigma_clip").is_some());
        assert!(report.text_summary().contains("masked 1/1024"));
    }

    #[test]
    fn config_is_checked_before_geometry() {
        let image = flat(8, 8);
        // Wrong shape and invalid alpha: the configuration error wins.
        let geometry = RadialGeometry::centered(ImageShape::new(9, 8));
        let err = auto_mask(&image, &geometry, None, &params().with_alpha(0.0)).unwrap_err();
        assert!(matches!(err, MaskError::Config(_)));
    }

    #[test]
    fn reused_binner_must_match_image() {
        let masker = AutoMasker::new(
            &RadialGeometry::centered(ImageShape::new(16, 16)),
            ImageShape::new(16, 16),
            params(),
        )
        .unwrap();
        let err = masker.process(&flat(16, 15), None).unwrap_err();
        assert!(matches!(err, MaskError::ShapeMismatch { .. }));
    }

    #[test]
    fn batch_keeps_input_order() {
        let shape = ImageShape::new(32, 32);
        let masker = AutoMasker::new(&RadialGeometry::centered(shape), shape, params()).unwrap();
        let mut hot = flat(32, 32);
        hot.set(5, 16, 50_000.0);
        let results = masker.process_batch(&[flat(32, 32), hot, flat(31, 32)], None);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().count(), 0);
        assert!(results[1].as_ref().unwrap().get(5, 16));
        assert!(results[2].is_err());
    }

    #[test]
    fn shared_binner_gives_identical_masks() {
        let shape = ImageShape::new(32, 32);
        let geometry = RadialGeometry::centered(shape);
        let binner = Binner::build(&geometry, shape, &BinnerOptions::uniform(8)).unwrap();
        let binner = Arc::new(binner);
        let a = AutoMasker::from_binner(Arc::clone(&binner), params()).unwrap();
        let mut image = flat(32, 32);
        image.set(10, 3, 0.0);
        let direct = auto_mask_with_binner(&image, &binner, None, &params()).unwrap();
        assert_eq!(a.process(&image, None).unwrap(), direct);
    }
}
