use super::exclusion::ExclusionSet;
use crate::error::{MaskError, Result};
use crate::image::Mask;

/// Merge the algorithmic exclusion with the user mask (logical OR).
///
/// The result is always a superset of `user_mask`.
pub fn combine_masks(exclusion: &ExclusionSet, user_mask: Option<&Mask>) -> Result<Mask> {
    let shape = exclusion.shape();
    let Some(user) = user_mask else {
        return Ok(exclusion.clone().into_mask());
    };
    MaskError::ensure_shape("user mask", shape, user.shape())?;
    let merged = exclusion
        .as_slice()
        .iter()
        .zip(user.as_slice())
        .map(|(&a, &u)| a || u)
        .collect();
    Mask::from_bools(shape.w, shape.h, merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageShape;

    #[test]
    fn without_user_mask_output_equals_exclusion() {
        let mut set = ExclusionSet::empty(ImageShape::new(3, 3));
        set.insert(4);
        let mask = combine_masks(&set, None).unwrap();
        assert_eq!(mask.count(), 1);
        assert!(mask.get(1, 1));
    }

    #[test]
    fn user_pixels_stay_masked() {
        let mut set = ExclusionSet::empty(ImageShape::new(3, 1));
        set.insert(0);
        let user = Mask::from_u8(3, 1, &[0, 0, 1]).unwrap();
        let mask = combine_masks(&set, Some(&user)).unwrap();
        assert_eq!(mask.to_u8(), vec![1, 0, 1]);
        assert!(mask.contains(&user));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let set = ExclusionSet::empty(ImageShape::new(3, 1));
        let err = combine_masks(&set, Some(&Mask::new(1, 3))).unwrap_err();
        assert!(matches!(err, MaskError::ShapeMismatch { .. }));
    }
}
