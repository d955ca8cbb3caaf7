use crate::binning::Binner;
use serde::{Deserialize, Serialize};

/// Summary of the binner used for a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinningStage {
    pub bin_count: usize,
    pub populated_bins: usize,
    pub unbinned_pixels: usize,
    /// Policy bins merged away for holding too few pixels.
    pub merged_bins: usize,
    /// Lowest and highest bin edge.
    pub range: [f64; 2],
    /// Time spent building the binner; zero when a prebuilt binner was reused.
    pub elapsed_ms: f64,
}

impl BinningStage {
    pub fn from_binner(binner: &Binner, elapsed_ms: f64) -> Self {
        let edges = binner.edges();
        Self {
            bin_count: binner.bin_count(),
            populated_bins: binner.populated_bins(),
            unbinned_pixels: binner.unbinned_count(),
            merged_bins: binner.merged_bins(),
            range: [edges[0], edges[edges.len() - 1]],
            elapsed_ms,
        }
    }
}

/// Pixels excluded before sigma clipping, by rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefilterStage {
    pub user_masked: usize,
    pub edge_masked: usize,
    pub threshold_masked: usize,
    pub non_finite: usize,
}

impl PrefilterStage {
    pub fn total(&self) -> usize {
        self.user_masked + self.edge_masked + self.threshold_masked + self.non_finite
    }
}

/// One sigma-clipping round.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementIteration {
    /// 1-based round number.
    pub iteration: usize,
    pub newly_flagged: usize,
    pub excluded_total: usize,
    pub bins_evaluated: usize,
    pub elapsed_ms: f64,
}
