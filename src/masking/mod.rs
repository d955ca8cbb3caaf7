//! Statistical outlier masking.
//!
//! Modules
//! - [`params`] – pipeline options ([`AutoMaskParams`]) and their defaults.
//! - [`exclusion`] – the monotonically growing [`ExclusionSet`].
//! - [`prefilter`] – seeding from the user mask, border margin and thresholds.
//! - [`outliers`] – per-bin sigma clipping ([`OutlierMasker`]).
//! - [`combine`] – merging with the user mask ([`combine_masks`]).

pub mod combine;
pub mod exclusion;
pub mod outliers;
pub mod params;
pub mod prefilter;

pub use combine::combine_masks;
pub use exclusion::ExclusionSet;
pub use outliers::{OutlierMasker, OutlierRun, RefineStep};
pub use params::AutoMaskParams;
pub use prefilter::seed_exclusion;
