//! Specter Core - frequency-domain image obfuscation.
//!
//! This crate perturbs an image's Fourier spectrum by a small, randomized
//! amount so the reconstructed image looks identical to the original while
//! its pixel values differ enough to defeat exact-match and perceptual-hash
//! duplicate detection.
//!
//! # Pipeline
//!
//! 1. Decode the container ([`codec`]) into a 16-bit [`RasterImage`].
//! 2. Forward-transform the R, G and B channels ([`SpectralImage::forward`]).
//! 3. Jitter a bounded random sample of mid-band coefficients ([`Perturber`]).
//! 4. Inverse-transform, normalize, clamp and reattach alpha
//!    ([`SpectralImage::inverse`]).
//! 5. Encode back to the original container.
//!
//! The result is a best-effort pixel-level perturbation, not a cryptographic
//! guarantee of any kind.
//!
//! # Example
//!
//! ```
//! use specter_core::{obfuscate_raster, PerturbationConfig, Perturber, RasterImage};
//!
//! # fn example() -> specter_core::Result<()> {
//! let original = RasterImage::from_fn(64, 64, |x, y| {
//!     [(x * 1000) as u16, (y * 1000) as u16, ((x ^ y) * 900) as u16, 65535]
//! });
//!
//! let mut perturber = Perturber::new(PerturbationConfig::default());
//! let (obfuscated, report) = obfuscate_raster(original.clone(), &mut perturber)?;
//!
//! assert_eq!(obfuscated.width(), original.width());
//! assert!(report.samples_per_channel > 0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod codec;
pub mod error;
pub mod perturb;
pub mod pipeline;
pub mod raster;
pub mod reconstruct;
pub mod spectrum;

#[cfg(feature = "batch")]
pub mod batch;

// Re-export main types for convenience
pub use codec::{EncodeOptions, ImageFormat, SUPPORTED_EXTENSIONS};
pub use error::{ObfuscationError, Result};
pub use perturb::{PerturbationConfig, PerturbationReport, Perturber, SampleRegion};
pub use pipeline::{obfuscate_file, obfuscate_raster, ObfuscationConfig, ObfuscationOutcome};
pub use raster::{RasterImage, CHANNEL_MAX};
pub use spectrum::{Channel, ChannelSpectrum, SpectralImage, TransformState};

#[cfg(feature = "batch")]
pub use batch::{
    discover, discover_jobs, BatchReport, BatchScheduler, FailedJob, InProcessRunner, Job,
    JobRunner, ProcessRunner,
};

/// Re-exported so callers can build coefficients without naming `rustfft`.
pub use rustfft::num_complex::Complex64;
