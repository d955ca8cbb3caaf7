use crate::image::Mask;
use crate::types::ImageShape;

/// Pixels currently excluded from statistics.
///
/// Grows monotonically: there is no way to re-include a pixel once it has
/// been inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExclusionSet {
    shape: ImageShape,
    excluded: Vec<bool>,
    count: usize,
}

impl ExclusionSet {
    pub fn empty(shape: ImageShape) -> Self {
        Self {
            shape,
            excluded: vec![false; shape.len()],
            count: 0,
        }
    }

    /// Seed from a mask (masked pixels are excluded).
    pub fn from_mask(mask: &Mask) -> Self {
        let excluded = mask.as_slice().to_vec();
        let count = excluded.iter().filter(|&&e| e).count();
        Self {
            shape: mask.shape(),
            excluded,
            count,
        }
    }

    #[inline]
    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    /// Number of excluded pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.excluded[index]
    }

    #[inline]
    pub fn contains_xy(&self, x: usize, y: usize) -> bool {
        self.excluded[self.shape.idx(x, y)]
    }

    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.excluded
    }

    /// Exclude pixel `index`; returns `true` when it was not excluded before.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        let newly = !self.excluded[index];
        if newly {
            self.excluded[index] = true;
            self.count += 1;
        }
        newly
    }

    /// New set holding `self` plus `indices`.
    pub fn union_with(&self, indices: &[usize]) -> Self {
        let mut next = self.clone();
        for &i in indices {
            next.insert(i);
        }
        next
    }

    pub fn is_superset_of(&self, other: &ExclusionSet) -> bool {
        self.shape == other.shape
            && self
                .excluded
                .iter()
                .zip(&other.excluded)
                .all(|(&mine, &theirs)| mine || !theirs)
    }

    pub fn into_mask(self) -> Mask {
        Mask::from_parts(self.shape, self.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_counts_only_new_pixels() {
        let mut set = ExclusionSet::empty(ImageShape::new(3, 2));
        assert!(set.insert(4));
        assert!(!set.insert(4));
        assert_eq!(set.len(), 1);
        assert!(set.contains_xy(1, 1));
    }

    #[test]
    fn union_grows_monotonically() {
        let mut base = ExclusionSet::empty(ImageShape::new(4, 1));
        base.insert(0);
        let grown = base.union_with(&[0, 2]);
        assert_eq!(grown.len(), 2);
        assert!(grown.is_superset_of(&base));
        assert!(!base.is_superset_of(&grown));
    }

    #[test]
    fn seeding_from_mask_round_trips() {
        let mask = Mask::from_u8(2, 2, &[1, 0, 0, 1]).unwrap();
        let set = ExclusionSet::from_mask(&mask);
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_mask(), mask);
    }
}
