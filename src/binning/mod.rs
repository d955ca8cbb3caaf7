//! Geometry binner: groups pixels into rings of physically equivalent
//! scattering.
//!
//! Overview
//! - Evaluates the geometry's quantity (Q, 2θ, radius…) at every pixel once.
//! - Partitions the observed (or configured) range into `K` contiguous bins
//!   according to a [`BinEdgePolicy`].
//! - Stores a per-pixel bin index; pixels the geometry marks invalid (gaps,
//!   beam stop) or whose quantity falls outside the range carry the
//!   [`UNBINNED`] sentinel and never take part in statistics or masking.
//!
//! A [`Binner`] depends only on (geometry, shape, options) and is never
//! mutated after construction, so one instance can be shared read-only across
//! any number of images with the same geometry.

mod edges;
pub mod options;

pub use options::{BinEdgePolicy, BinnerOptions, DEFAULT_BIN_COUNT};

use crate::error::{MaskError, Result};
use crate::geometry::{Geometry, PixelSample};
use crate::types::ImageShape;
use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Bin index of pixels excluded from binning.
pub const UNBINNED: u32 = u32::MAX;

#[derive(Clone, Debug)]
pub struct Binner {
    shape: ImageShape,
    bin_index: Vec<u32>,
    edges: Vec<f64>,
    pixel_counts: Vec<usize>,
    unbinned: usize,
    merged_bins: usize,
}

impl Binner {
    /// Evaluate `geometry` over `shape` and assign every pixel to a bin.
    pub fn build<G: Geometry + ?Sized>(
        geometry: &G,
        shape: ImageShape,
        options: &BinnerOptions,
    ) -> Result<Self> {
        options.validate()?;
        geometry.validate_shape(shape)?;
        if shape.is_empty() {
            return Err(MaskError::Geometry(format!(
                "cannot bin an empty {shape} image"
            )));
        }

        let samples = evaluate(geometry, shape);
        let (lo, hi) = observed_range(&samples, shape)?;
        let (lo, hi) = options.range.unwrap_or((lo, hi));

        let edges = match options.policy {
            BinEdgePolicy::Uniform { count } => {
                if hi > lo {
                    edges::uniform_edges(lo, hi, count)
                } else {
                    warn!("Binner::build range collapsed to {lo}; 1 bin instead of {count}");
                    edges::uniform_edges(lo, hi, 1)
                }
            }
            BinEdgePolicy::PixelResolution => {
                let in_range: Vec<(f64, f64)> = samples
                    .iter()
                    .flatten()
                    .filter(|s| s.value >= lo && s.value <= hi)
                    .map(|s| (s.value, s.radius))
                    .collect();
                let step = 0.5 * geometry.radial_resolution();
                edges::pixel_resolution_edges(&in_range, lo, hi, step)
            }
        };

        let (edges, merged_bins) = if options.min_pixels_per_bin > 1 {
            let mut counts = vec![0usize; edges.len() - 1];
            for s in samples.iter().flatten() {
                if let Some(k) = edges::locate(&edges, s.value) {
                    counts[k] += 1;
                }
            }
            let merged = edges::merge_sparse_bins(&edges, &counts, options.min_pixels_per_bin);
            let absorbed = edges.len() - merged.len();
            (merged, absorbed)
        } else {
            (edges, 0)
        };

        let bins = edges.len() - 1;
        let mut pixel_counts = vec![0usize; bins];
        let mut unbinned = 0usize;
        let bin_index: Vec<u32> = samples
            .iter()
            .map(|sample| {
                match sample.and_then(|s| edges::locate(&edges, s.value)) {
                    Some(k) => {
                        pixel_counts[k] += 1;
                        k as u32
                    }
                    None => {
                        unbinned += 1;
                        UNBINNED
                    }
                }
            })
            .collect();

        debug!(
            "Binner::build shape={} bins={} merged={} range=[{:.6}, {:.6}] unbinned={}",
            shape, bins, merged_bins, lo, hi, unbinned
        );

        Ok(Self {
            shape,
            bin_index,
            edges,
            pixel_counts,
            unbinned,
            merged_bins,
        })
    }

    #[inline]
    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    /// Number of bins `K`.
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.pixel_counts.len()
    }

    /// Ascending bin boundaries, `K + 1` values.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Row-major per-pixel bin indices; [`UNBINNED`] marks excluded pixels.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.bin_index
    }

    /// Bin of pixel (x, y), `None` when unbinned.
    #[inline]
    pub fn bin_of(&self, x: usize, y: usize) -> Option<usize> {
        match self.bin_index[self.shape.idx(x, y)] {
            UNBINNED => None,
            k => Some(k as usize),
        }
    }

    /// Number of pixels assigned to bin `k`, regardless of any exclusion.
    pub fn pixels_in_bin(&self, k: usize) -> usize {
        self.pixel_counts[k]
    }

    pub fn unbinned_count(&self) -> usize {
        self.unbinned
    }

    /// Policy bins absorbed into neighbours by `min_pixels_per_bin`.
    pub fn merged_bins(&self) -> usize {
        self.merged_bins
    }

    /// Bins holding at least one pixel.
    pub fn populated_bins(&self) -> usize {
        self.pixel_counts.iter().filter(|&&c| c > 0).count()
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate<G: Geometry + ?Sized>(geometry: &G, shape: ImageShape) -> Vec<Option<PixelSample>> {
    let mut samples = Vec::with_capacity(shape.len());
    for y in 0..shape.h {
        samples.extend((0..shape.w).map(|x| geometry.sample(x, y)));
    }
    samples
}

#[cfg(feature = "parallel")]
fn evaluate<G: Geometry + ?Sized>(geometry: &G, shape: ImageShape) -> Vec<Option<PixelSample>> {
    let mut samples = vec![None; shape.len()];
    samples
        .par_chunks_mut(shape.w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, dst) in row.iter_mut().enumerate() {
                *dst = geometry.sample(x, y);
            }
        });
    samples
}

/// Min/max over valid samples; non-finite values are a geometry failure.
fn observed_range(samples: &[Option<PixelSample>], shape: ImageShape) -> Result<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (i, sample) in samples.iter().enumerate() {
        let Some(s) = sample else { continue };
        if !(s.value.is_finite() && s.radius.is_finite()) {
            return Err(MaskError::Geometry(format!(
                "non-finite coordinate at pixel ({}, {}) of a {shape} image",
                i % shape.w,
                i / shape.w
            )));
        }
        lo = lo.min(s.value);
        hi = hi.max(s.value);
    }
    if lo > hi {
        return Err(MaskError::Geometry(format!(
            "geometry marks every pixel of the {shape} image invalid"
        )));
    }
    Ok((lo, hi))
}
