//! Randomized coefficient jitter in the frequency domain.
//!
//! # Algorithm
//!
//! For every color channel independently:
//!
//! 1. Restrict candidates to the central band of the spectrum,
//!    `x ∈ [W/4, W/4 + W/2)` and `y ∈ [H/4, H/4 + H/2)`. This skips the lowest
//!    frequencies (overall brightness and structure) and the highest
//!    (fine detail and noise floor).
//! 2. Draw `min(max_samples, region_len / 4)` coordinates uniformly from that
//!    band. Coordinates are drawn with replacement; a repeated coordinate
//!    receives the jitter again, compounding it.
//! 3. Multiply the real and imaginary parts of each drawn coefficient by
//!    `1 + epsilon`.
//!
//! The generator is seeded from OS entropy unless a seed is configured, so two
//! obfuscations of the same input normally differ.

use std::collections::HashSet;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex64;
use serde::Serialize;
use tracing::debug;

use crate::error::{ObfuscationError, Result};
use crate::spectrum::{Channel, SpectralImage};

/// Default upper bound on sampled coefficients per channel.
pub const DEFAULT_MAX_SAMPLES: usize = 10_000;

/// Default relative jitter applied to each sampled coefficient.
pub const DEFAULT_EPSILON: f64 = 1e-3;

/// Perturbation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerturbationConfig {
    /// Upper bound on samples per channel.
    pub max_samples: usize,
    /// Relative jitter: each part of a coefficient is scaled by `1 + epsilon`.
    pub epsilon: f64,
    /// Fixed RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            max_samples: std::env::var("SPECTER_MAX_SAMPLES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SAMPLES),
            epsilon: std::env::var("SPECTER_EPSILON")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|e: &f64| e.is_finite())
                .unwrap_or(DEFAULT_EPSILON),
            seed: None,
        }
    }
}

/// The central band of a W×H spectrum eligible for perturbation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRegion {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

impl SampleRegion {
    pub fn central(width: usize, height: usize) -> Self {
        let x0 = width / 4;
        let y0 = height / 4;
        Self {
            x: x0..x0 + width / 2,
            y: y0..y0 + height / 2,
        }
    }

    /// Number of coefficients in the region.
    pub fn len(&self) -> usize {
        self.x.len() * self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.x.contains(&x) && self.y.contains(&y)
    }
}

/// Summary of one perturbation pass.
#[derive(Debug, Clone, Serialize)]
pub struct PerturbationReport {
    pub region: SampleRegion,
    /// Samples drawn for each channel.
    pub samples_per_channel: usize,
    /// Distinct coordinates touched, per channel in RGB order.
    pub distinct: [usize; 3],
}

/// Applies jitter to the spectra of a [`SpectralImage`].
pub struct Perturber {
    config: PerturbationConfig,
    rng: StdRng,
}

impl Perturber {
    pub fn new(config: PerturbationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &PerturbationConfig {
        &self.config
    }

    /// Samples drawn per channel for `region`.
    pub fn sample_count(&self, region: &SampleRegion) -> usize {
        if region.is_empty() {
            return 0;
        }
        self.config.max_samples.min(region.len() / 4)
    }

    /// Jitter the spectra of `image` in place.
    ///
    /// Fails with [`ObfuscationError::TransformNotPerformed`] when no forward
    /// transform is held.
    pub fn perturb(&mut self, image: &SpectralImage) -> Result<PerturbationReport> {
        if !image.is_transformed() {
            return Err(ObfuscationError::TransformNotPerformed);
        }

        let region = SampleRegion::central(image.width(), image.height());
        let samples = self.sample_count(&region);
        let factor = 1.0 + self.config.epsilon;
        let mut distinct = [0usize; 3];

        for channel in Channel::ALL {
            let mut touched = HashSet::with_capacity(samples);
            for _ in 0..samples {
                let y = self.rng.gen_range(region.y.clone());
                let x = self.rng.gen_range(region.x.clone());
                image.update_coefficient(channel, x, y, |c| {
                    Complex64::new(c.re * factor, c.im * factor)
                })?;
                touched.insert((x, y));
            }
            distinct[channel.index()] = touched.len();
        }

        debug!(
            samples,
            region_len = region.len(),
            epsilon = self.config.epsilon,
            "Perturbed spectra"
        );

        Ok(PerturbationReport {
            region,
            samples_per_channel: samples,
            distinct,
        })
    }
}
