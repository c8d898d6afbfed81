//! Per-image obfuscation pipeline.
//!
//! decode → forward transform → perturb → inverse transform → encode.
//!
//! The transform state is owned by the [`SpectralImage`] created inside
//! [`obfuscate_raster`] and is released before that function returns, on the
//! success path and on every error path.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::codec::{self, EncodeOptions, ImageFormat};
use crate::error::Result;
use crate::perturb::{PerturbationConfig, PerturbationReport, Perturber};
use crate::raster::RasterImage;
use crate::spectrum::SpectralImage;

/// Settings for one obfuscation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ObfuscationConfig {
    pub perturbation: PerturbationConfig,
    pub encode: EncodeOptions,
}

/// Result of obfuscating one file.
#[derive(Debug, Clone, Serialize)]
pub struct ObfuscationOutcome {
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    pub perturbation: PerturbationReport,
}

/// Obfuscate an in-memory image, returning a new image.
pub fn obfuscate_raster(
    raster: RasterImage,
    perturber: &mut Perturber,
) -> Result<(RasterImage, PerturbationReport)> {
    let image = SpectralImage::new(raster);
    image.forward(false);
    let report = perturber.perturb(&image)?;
    let output = image.inverse();
    image.release();
    Ok((output, report))
}

/// Obfuscate `input` and write the result to `output`.
///
/// `input` and `output` may be the same path. The format is chosen from the
/// input extension; unsupported and animated inputs fail before `output` is
/// touched.
#[instrument(level = "debug", skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn obfuscate_file(
    input: &Path,
    output: &Path,
    config: &ObfuscationConfig,
) -> Result<ObfuscationOutcome> {
    let format = ImageFormat::from_path(input)?;
    let raster = codec::decode(input, format)?;
    let (width, height) = (raster.width(), raster.height());

    let mut perturber = Perturber::new(config.perturbation);
    let (obfuscated, perturbation) = obfuscate_raster(raster, &mut perturber)?;
    debug!(
        samples = perturbation.samples_per_channel,
        "Reconstructed obfuscated image"
    );

    codec::encode(&obfuscated, format, output, &config.encode)?;
    info!(format = %format, width, height, "Obfuscated image");

    Ok(ObfuscationOutcome {
        format,
        width,
        height,
        perturbation,
    })
}
