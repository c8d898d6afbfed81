//! Spectral transform engine.
//!
//! Each color channel of an image is carried into the frequency domain with a
//! 2D discrete Fourier transform, one [`ChannelSpectrum`] per channel. Alpha is
//! never transformed.
//!
//! # Index convention
//!
//! Pixel `(x, y)` and frequency bin `(x, y)` both live at `y * width + x`
//! (row-major, X varying fastest). Forward and inverse transforms share this
//! convention, so bin `(0, 0)` is always the DC term.
//!
//! # Usage
//!
//! ```
//! use specter_core::raster::RasterImage;
//! use specter_core::spectrum::{Channel, SpectralImage};
//!
//! let raster = RasterImage::from_fn(4, 4, |x, y| [(x * 1000) as u16, (y * 1000) as u16, 0, 65535]);
//! let image = SpectralImage::new(raster.clone());
//! image.forward(false);
//!
//! let dc = image.coefficient(Channel::Red, 0, 0).unwrap();
//! assert!(dc.re > 0.0);
//!
//! let restored = image.inverse();
//! assert_eq!(restored, raster);
//! ```

mod engine;
mod plan;

pub use engine::{SpectralImage, TransformState};

use std::fmt;

use rustfft::num_complex::Complex64;

/// A transformable color channel. Alpha is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All transformable channels in RGB order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Position of this channel within an RGBA pixel.
    pub const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Red => write!(f, "red"),
            Channel::Green => write!(f, "green"),
            Channel::Blue => write!(f, "blue"),
        }
    }
}

/// W×H grid of complex coefficients for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpectrum {
    width: usize,
    height: usize,
    data: Vec<Complex64>,
}

impl ChannelSpectrum {
    pub(crate) fn new(width: usize, height: usize, data: Vec<Complex64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Coefficient at bin `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<Complex64> {
        self.offset(x, y).map(|i| self.data[i])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Complex64> {
        self.offset(x, y).map(move |i| &mut self.data[i])
    }

    /// The zero-frequency (average brightness) term.
    pub fn dc(&self) -> Option<Complex64> {
        self.get(0, 0)
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order() {
        let indices: Vec<usize> = Channel::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(Channel::Green.to_string(), "green");
    }

    #[test]
    fn test_spectrum_indexing_is_row_major() {
        let data = (0..6).map(|i| Complex64::new(i as f64, 0.0)).collect();
        let mut spectrum = ChannelSpectrum::new(3, 2, data);

        assert_eq!(spectrum.get(2, 0), Some(Complex64::new(2.0, 0.0)));
        assert_eq!(spectrum.get(0, 1), Some(Complex64::new(3.0, 0.0)));
        assert_eq!(spectrum.get(3, 0), None);
        assert_eq!(spectrum.get(0, 2), None);

        *spectrum.get_mut(1, 1).unwrap() = Complex64::new(-1.0, 2.0);
        assert_eq!(spectrum.as_slice()[4], Complex64::new(-1.0, 2.0));
        assert_eq!(spectrum.dc(), Some(Complex64::new(0.0, 0.0)));
    }
}
