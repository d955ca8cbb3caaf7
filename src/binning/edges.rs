//! Bin boundary construction and lookup.
//!
//! Edges are ascending with `K + 1` entries for `K` bins. Bin `k` covers
//! `[edges[k], edges[k + 1])`, except the last bin which also includes its
//! upper edge so the maximum observed value is binned.

/// `count` equal-width bins over `[lo, hi]`. The last edge is exactly `hi`.
pub(crate) fn uniform_edges(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let count = count.max(1);
    let width = (hi - lo) / count as f64;
    let mut edges: Vec<f64> = (0..count).map(|i| lo + i as f64 * width).collect();
    edges.push(hi);
    edges
}

/// Edges following the detector's radial resolution.
///
/// The radial extent of `samples` (value, radius) is cut into steps of
/// `step`; the largest value reached in each step becomes a candidate edge.
/// Candidates are accumulated as a running maximum so the result stays
/// strictly ascending even when the quantity is not monotone in radius
/// (tilted detectors).
pub(crate) fn pixel_resolution_edges(
    samples: &[(f64, f64)],
    lo: f64,
    hi: f64,
    step: f64,
) -> Vec<f64> {
    let mut edges = vec![lo];
    if samples.is_empty() || !(step > 0.0) || hi <= lo {
        edges.push(hi);
        return edges;
    }

    let (r_min, r_max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &(_, r)| {
            (a.min(r), b.max(r))
        });
    let steps = (((r_max - r_min) / step).ceil() as usize).max(1);
    let mut step_max = vec![f64::NEG_INFINITY; steps];
    for &(value, radius) in samples {
        let k = (((radius - r_min) / step) as usize).min(steps - 1);
        if value > step_max[k] {
            step_max[k] = value;
        }
    }

    let mut running = lo;
    for candidate in step_max {
        running = running.max(candidate);
        let last = edges[edges.len() - 1];
        if running > last && running < hi {
            edges.push(running);
        }
    }
    edges.push(hi);
    edges
}

/// Coalesce consecutive bins until each holds at least `min_pixels` pixels.
///
/// `counts[k]` is the number of pixels in `[edges[k], edges[k + 1])`. A tail
/// that never reaches `min_pixels` is folded into the last closed bin. The
/// outer edges are kept, so every previously binned value stays binned.
pub(crate) fn merge_sparse_bins(edges: &[f64], counts: &[usize], min_pixels: usize) -> Vec<f64> {
    debug_assert_eq!(edges.len(), counts.len() + 1);
    let mut merged = vec![edges[0]];
    let mut pending = 0usize;
    for (k, &count) in counts.iter().enumerate() {
        pending += count;
        if pending >= min_pixels {
            merged.push(edges[k + 1]);
            pending = 0;
        }
    }
    let hi = edges[edges.len() - 1];
    match merged.len() {
        1 => merged.push(hi),
        n => merged[n - 1] = hi,
    }
    merged
}

/// Index of the bin containing `value`, or `None` outside `[edges[0], edges[K]]`.
#[inline]
pub(crate) fn locate(edges: &[f64], value: f64) -> Option<usize> {
    let bins = edges.len().checked_sub(1)?;
    if bins == 0 || !(value >= edges[0] && value <= edges[bins]) {
        return None;
    }
    let upper = edges.partition_point(|&e| e <= value);
    Some(upper.saturating_sub(1).min(bins - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_edges_cover_range_exactly() {
        let edges = uniform_edges(0.0, 1.0, 4);
        assert_eq!(edges, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn locate_includes_upper_edge_in_last_bin() {
        let edges = uniform_edges(0.0, 1.0, 4);
        assert_eq!(locate(&edges, 0.0), Some(0));
        assert_eq!(locate(&edges, 0.25), Some(1));
        assert_eq!(locate(&edges, 0.999), Some(3));
        assert_eq!(locate(&edges, 1.0), Some(3));
        assert_eq!(locate(&edges, 1.0001), None);
        assert_eq!(locate(&edges, -0.1), None);
        assert_eq!(locate(&edges, f64::NAN), None);
    }

    #[test]
    fn degenerate_edges_put_everything_in_one_bin() {
        let edges = uniform_edges(2.0, 2.0, 1);
        assert_eq!(locate(&edges, 2.0), Some(0));
    }

    #[test]
    fn pixel_resolution_edges_are_strictly_ascending() {
        // value = 2 * radius, one sample every 0.25 radius units
        let samples: Vec<(f64, f64)> = (0..=40)
            .map(|i| {
                let r = i as f64 * 0.25;
                (2.0 * r, r)
            })
            .collect();
        let edges = pixel_resolution_edges(&samples, 0.0, 20.0, 1.0);
        assert!(edges.windows(2).all(|w| w[0] < w[1]), "{edges:?}");
        assert_eq!(edges[0], 0.0);
        assert_eq!(*edges.last().unwrap(), 20.0);
        // ten radial steps of width 1 -> ten bins
        assert_eq!(edges.len(), 11);
    }

    #[test]
    fn sparse_bins_are_merged_forward() {
        let edges = uniform_edges(0.0, 6.0, 6);
        let merged = merge_sparse_bins(&edges, &[1, 2, 9, 0, 3, 1], 3);
        // [1, 2] -> 3, [9], [0, 3] -> 3, trailing [1] folds into the last bin
        assert_eq!(merged, vec![0.0, 2.0, 3.0, 6.0]);
    }

    #[test]
    fn too_few_pixels_leave_a_single_bin() {
        let edges = uniform_edges(1.0, 5.0, 4);
        assert_eq!(merge_sparse_bins(&edges, &[1, 0, 2, 1], 10), vec![1.0, 5.0]);
    }

    #[test]
    fn well_populated_bins_are_untouched() {
        let edges = uniform_edges(0.0, 1.0, 4);
        assert_eq!(merge_sparse_bins(&edges, &[5, 5, 5, 5], 5), edges);
    }
}
