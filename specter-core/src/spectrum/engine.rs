//! Transform state ownership and the per-image engine.

use parking_lot::RwLock;
use rustfft::num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};
use tracing::{debug, trace};

use super::plan::Plan2d;
use super::{Channel, ChannelSpectrum};
use crate::error::{ObfuscationError, Result};
use crate::raster::RasterImage;
use crate::reconstruct;

/// Planned transforms and spectra for one image.
struct TransformResources {
    inverse: Plan2d,
    spectra: [ChannelSpectrum; 3],
}

/// Owns the transform resources of one image.
///
/// The state is either *valid* (a forward transform has been computed) or
/// *released*. Releasing is idempotent, and dropping the state releases it,
/// so every exit path of the owning scope frees the resources exactly once.
pub struct TransformState {
    resources: Option<TransformResources>,
}

impl TransformState {
    /// A state with no forward transform performed.
    pub fn empty() -> Self {
        Self { resources: None }
    }

    /// Whether a forward transform is held.
    pub fn is_valid(&self) -> bool {
        self.resources.is_some()
    }

    /// Free the plans and spectra.
    ///
    /// Returns `true` if anything was freed; a second call is a no-op that
    /// returns `false`.
    pub fn release(&mut self) -> bool {
        match self.resources.take() {
            Some(_) => {
                trace!("Released transform state");
                true
            }
            None => false,
        }
    }

    /// Spectrum of `channel`.
    pub fn spectrum(&self, channel: Channel) -> Result<&ChannelSpectrum> {
        self.resources
            .as_ref()
            .map(|r| &r.spectra[channel.index()])
            .ok_or(ObfuscationError::TransformNotPerformed)
    }

    fn spectrum_mut(&mut self, channel: Channel) -> Result<&mut ChannelSpectrum> {
        self.resources
            .as_mut()
            .map(|r| &mut r.spectra[channel.index()])
            .ok_or(ObfuscationError::TransformNotPerformed)
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for TransformState {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for TransformState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformState")
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// A decoded image paired with its (at most one) transform state.
///
/// Coefficient reads take a shared lock; coefficient writes, transform
/// (re)computation and release take an exclusive lock.
#[derive(Debug)]
pub struct SpectralImage {
    source: RasterImage,
    state: RwLock<TransformState>,
}

impl SpectralImage {
    pub fn new(source: RasterImage) -> Self {
        Self {
            source,
            state: RwLock::new(TransformState::empty()),
        }
    }

    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    pub fn width(&self) -> usize {
        self.source.width()
    }

    pub fn height(&self) -> usize {
        self.source.height()
    }

    /// Whether a forward transform is currently held.
    pub fn is_transformed(&self) -> bool {
        self.state.read().is_valid()
    }

    /// Compute the forward transform of the R, G and B channels.
    ///
    /// When a valid state exists and `force` is false this is a cache hit and
    /// returns `false`. Otherwise the previous state is released before the
    /// transform is recomputed, and `true` is returned.
    pub fn forward(&self, force: bool) -> bool {
        let mut state = self.state.write();
        if !force && state.is_valid() {
            trace!("Forward transform cache hit");
            return false;
        }
        state.release();

        let (width, height) = (self.width(), self.height());
        let len = self.source.len();
        let mut planes: [Vec<Complex64>; 3] = std::array::from_fn(|_| Vec::with_capacity(len));
        for pixel in self.source.pixels() {
            for channel in Channel::ALL {
                planes[channel.index()].push(Complex64::new(pixel[channel.index()] as f64, 0.0));
            }
        }

        let mut planner = FftPlanner::new();
        let forward = Plan2d::new(&mut planner, width, height, FftDirection::Forward);
        let inverse = Plan2d::new(&mut planner, width, height, FftDirection::Inverse);

        let spectra = planes.map(|mut plane| {
            forward.execute(&mut plane);
            ChannelSpectrum::new(width, height, plane)
        });

        state.resources = Some(TransformResources { inverse, spectra });
        debug!(width, height, "Computed forward transform");
        true
    }

    /// Reconstruct a new image from the current spectra.
    ///
    /// Each channel is inverse-transformed and divided by W×H, then clamped
    /// and reassembled with the source alpha. Without a forward transform the
    /// source image is returned unchanged.
    pub fn inverse(&self) -> RasterImage {
        let state = self.state.read();
        let Some(resources) = state.resources.as_ref() else {
            debug!("Inverse requested before forward transform; returning source");
            return self.source.clone();
        };

        let scale = self.source.len() as f64;
        let channels = resources.spectra.each_ref().map(|spectrum| {
            let mut buffer = spectrum.as_slice().to_vec();
            resources.inverse.execute(&mut buffer);
            buffer.into_iter().map(|c| c.re / scale).collect::<Vec<f64>>()
        });

        debug!(
            width = self.width(),
            height = self.height(),
            "Computed inverse transform"
        );
        reconstruct::assemble(&self.source, &channels)
    }

    /// Read one coefficient.
    pub fn coefficient(&self, channel: Channel, x: usize, y: usize) -> Result<Complex64> {
        let state = self.state.read();
        let spectrum = state.spectrum(channel)?;
        spectrum
            .get(x, y)
            .ok_or_else(|| self.out_of_range(channel, x, y))
    }

    /// Overwrite one coefficient.
    pub fn set_coefficient(
        &self,
        channel: Channel,
        x: usize,
        y: usize,
        value: Complex64,
    ) -> Result<()> {
        self.update_coefficient(channel, x, y, |_| value).map(|_| ())
    }

    /// Read-modify-write one coefficient under a single exclusive lock.
    ///
    /// Returns the value written.
    pub fn update_coefficient(
        &self,
        channel: Channel,
        x: usize,
        y: usize,
        f: impl FnOnce(Complex64) -> Complex64,
    ) -> Result<Complex64> {
        let mut state = self.state.write();
        let spectrum = state.spectrum_mut(channel)?;
        let slot = spectrum
            .get_mut(x, y)
            .ok_or_else(|| self.out_of_range(channel, x, y))?;
        *slot = f(*slot);
        Ok(*slot)
    }

    /// Run `f` against the spectrum of `channel` under a shared lock.
    pub fn with_spectrum<R>(
        &self,
        channel: Channel,
        f: impl FnOnce(&ChannelSpectrum) -> R,
    ) -> Result<R> {
        let state = self.state.read();
        state.spectrum(channel).map(f)
    }

    /// Release the transform state. Idempotent; returns whether anything was
    /// freed.
    pub fn release(&self) -> bool {
        self.state.write().release()
    }

    fn out_of_range(&self, channel: Channel, x: usize, y: usize) -> ObfuscationError {
        ObfuscationError::CoordinateOutOfRange {
            channel,
            x,
            y,
            width: self.width(),
            height: self.height(),
        }
    }
}
