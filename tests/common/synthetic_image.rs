use auto_mask::image::ImageF32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Constant-intensity image.
pub fn flat_image(width: usize, height: usize, value: f32) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    ImageF32::filled(width, height, value)
}

/// Powder-like image: intensity decays with distance from the image centre,
/// plus bounded pseudo-random noise of amplitude `noise` (uniform, reproducible
/// from `seed`).
pub fn ring_image(width: usize, height: usize, noise: f32, seed: u64) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let cx = (width as f32 - 1.0) * 0.5;
    let cy = (height as f32 - 1.0) * 0.5;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x as f32 - cx).hypot(y as f32 - cy);
            let profile = 100.0 + 400.0 * (-r / 25.0).exp();
            img.set(x, y, profile + noise * rng.random_range(-1.0f32..1.0));
        }
    }
    img
}

/// Multiply the listed pixels by `factor`.
pub fn with_defects(mut img: ImageF32, pixels: &[(usize, usize)], factor: f32) -> ImageF32 {
    for &(x, y) in pixels {
        let v = img.get(x, y);
        img.set(x, y, v * factor);
    }
    img
}

/// One-row image whose values are used as-is; paired with a radial geometry
/// centred at (0, 0) the column index is the binning quantity.
pub fn strip(values: &[f32]) -> ImageF32 {
    ImageF32::from_vec(values.len(), 1, values.to_vec()).expect("strip length")
}
