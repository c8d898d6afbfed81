//! Reconstruction of pixel data from inverse-transformed channels.

use crate::raster::{RasterImage, CHANNEL_MAX};

/// Clamp one inverse-transformed sample into `0..=CHANNEL_MAX`.
///
/// Values are rounded to the nearest integer first. Non-finite values map to
/// zero.
pub fn clamp_sample(value: f64) -> u16 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, CHANNEL_MAX as f64) as u16
}

/// Assemble three normalized channel planes and the source alpha into a new
/// image.
///
/// Each plane is row-major with `source.len()` samples. Alpha is copied from
/// `source` at every coordinate.
pub fn assemble(source: &RasterImage, channels: &[Vec<f64>; 3]) -> RasterImage {
    debug_assert!(channels.iter().all(|plane| plane.len() == source.len()));

    let [red, green, blue] = channels;
    RasterImage::from_fn(source.width(), source.height(), |x, y| {
        let i = source.index(x, y);
        [
            clamp_sample(red[i]),
            clamp_sample(green[i]),
            clamp_sample(blue[i]),
            source.pixels()[i][3],
        ]
    })
}
