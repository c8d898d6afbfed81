//! Pixel-domain image representation.
//!
//! A [`RasterImage`] stores every pixel as a 16-bit RGBA tuple, which is the
//! widest depth any supported container produces. Decoded 8-bit data is
//! widened by the `image` crate (`v * 257`) so the full channel range is
//! always `0..=65535`.

use image::{DynamicImage, ImageBuffer, Rgba};

/// Maximum value of one channel sample.
pub const CHANNEL_MAX: u16 = u16::MAX;

/// One RGBA pixel, 16 bits per channel.
pub type Pixel = [u16; 4];

/// An immutable W×H grid of RGBA pixels stored row-major (X fastest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl RasterImage {
    /// Build an image from row-major pixels.
    ///
    /// Returns `None` when `pixels.len() != width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Pixel>) -> Option<Self> {
        if width.checked_mul(height)? != pixels.len() {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image by evaluating `f(x, y)` for every coordinate.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Pixel) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels (W×H).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Pixel at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Convert a decoded image, widening every channel to 16 bits.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba16();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);
        let pixels = rgba.pixels().map(|p| p.0).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert into a 16-bit RGBA `DynamicImage` ready for encoding.
    pub fn to_dynamic(&self) -> DynamicImage {
        let mut buffer: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::new(self.width as u32, self.height as u32);
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            *pixel = Rgba(self.pixels[self.index(x as usize, y as usize)]);
        }
        DynamicImage::ImageRgba16(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_rejects_wrong_length() {
        assert!(RasterImage::from_pixels(2, 2, vec![[0; 4]; 3]).is_none());
        assert!(RasterImage::from_pixels(2, 2, vec![[0; 4]; 4]).is_some());
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let img = RasterImage::from_fn(3, 2, |x, y| [x as u16, y as u16, 0, 0]);
        assert_eq!(img.pixels()[1], [1, 0, 0, 0]);
        assert_eq!(img.pixels()[3], [0, 1, 0, 0]);
        assert_eq!(img.pixel(2, 1), Some([2, 1, 0, 0]));
        assert_eq!(img.pixel(3, 0), None);
    }

    #[test]
    fn test_dynamic_conversion_widens_8bit() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([255, 0, 128, 10]));
        rgba.put_pixel(1, 0, Rgba([1, 2, 3, 255]));
        let raster = RasterImage::from_dynamic(&DynamicImage::ImageRgba8(rgba));

        assert_eq!(raster.pixel(0, 0), Some([65535, 0, 128 * 257, 10 * 257]));
        assert_eq!(raster.pixel(1, 0), Some([257, 514, 771, 65535]));

        let back = RasterImage::from_dynamic(&raster.to_dynamic());
        assert_eq!(back, raster);
    }
}
