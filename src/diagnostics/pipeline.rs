use crate::diagnostics::{BinningStage, PrefilterStage, RefinementIteration, TimingBreakdown};
use crate::image::Mask;
use serde::Serialize;

/// Result produced by [`AutoMasker::process_with_diagnostics`](crate::AutoMasker).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskReport {
    #[serde(skip)]
    pub mask: Mask,
    pub summary: MaskSummary,
    pub trace: MaskTrace,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskSummary {
    pub masked_pixels: usize,
    pub total_pixels: usize,
    pub masked_fraction: f64,
}

impl MaskSummary {
    pub fn from_mask(mask: &Mask) -> Self {
        let masked_pixels = mask.count();
        let total_pixels = mask.shape().len();
        let masked_fraction = if total_pixels > 0 {
            masked_pixels as f64 / total_pixels as f64
        } else {
            0.0
        };
        Self {
            masked_pixels,
            total_pixels,
            masked_fraction,
        }
    }
}

/// Stage-by-stage record of one masking run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskTrace {
    pub input: InputDescriptor,
    pub binning: BinningStage,
    pub prefilter: PrefilterStage,
    pub iterations: Vec<RefinementIteration>,
    /// False when the iteration cap stopped the loop.
    pub converged: bool,
    pub timings: TimingBreakdown,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    pub alpha: f64,
    pub max_iterations: usize,
    pub user_mask: bool,
}

impl MaskReport {
    /// Multi-line human-readable summary.
    pub fn text_summary(&self) -> String {
        let t = &self.trace;
        let mut out = format!(
            "auto-mask {}x{} alpha={:.2}: masked {}/{} ({:.3}%)\n",
            t.input.width,
            t.input.height,
            t.input.alpha,
            self.summary.masked_pixels,
            self.summary.total_pixels,
            self.summary.masked_fraction * 100.0
        );
        out.push_str(&format!(
            "  bins={} populated={} unbinned={} range=[{:.4}, {:.4}]\n",
            t.binning.bin_count,
            t.binning.populated_bins,
            t.binning.unbinned_pixels,
            t.binning.range[0],
            t.binning.range[1]
        ));
        out.push_str(&format!(
            "  prefilter user={} edge={} threshold={} non_finite={}\n",
            t.prefilter.user_masked,
            t.prefilter.edge_masked,
            t.prefilter.threshold_masked,
            t.prefilter.non_finite
        ));
        for it in &t.iterations {
            out.push_str(&format!(
                "  iter {}: +{} (excluded {}, bins {}) {:.2} ms\n",
                it.iteration, it.newly_flagged, it.excluded_total, it.bins_evaluated, it.elapsed_ms
            ));
        }
        out.push_str(&format!(
            "  converged={} total={:.2} ms",
            t.converged, t.timings.total_ms
        ));
        out
    }
}
