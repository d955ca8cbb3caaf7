//! Serializable diagnostics describing a masking run.
//!
//! [`MaskReport`] is the entry point returned by the pipeline: the final mask,
//! a summary, and a [`MaskTrace`] recording binning, pre-filtering, every
//! sigma-clipping round and stage timings.

pub mod pipeline;
pub mod stages;
pub mod timing;

pub use pipeline::{InputDescriptor, MaskReport, MaskSummary, MaskTrace};
pub use stages::{BinningStage, PrefilterStage, RefinementIteration};
pub use timing::{StageTiming, TimingBreakdown};
