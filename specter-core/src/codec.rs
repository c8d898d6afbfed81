//! Container detection, decoding and encoding.
//!
//! Supports PNG, JPEG and single-frame GIF. The container is chosen by file
//! extension (case-insensitive), never by sniffing content.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Seek, Write};
use std::path::Path;

use image::codecs::gif::{GifDecoder, GifEncoder};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{AnimationDecoder, DynamicImage, Frame, ImageError};
use serde::Serialize;
use tracing::debug;

use crate::error::{ObfuscationError, Result};
use crate::raster::RasterImage;

/// Extensions accepted for obfuscation, lowercase.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Default JPEG output quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Default NeuQuant speed for GIF palette quantization (1 = best, 30 = fastest).
pub const DEFAULT_GIF_SPEED: i32 = 10;

/// Supported image containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Map a file extension (without the dot, any case).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detect the container from `path`'s extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| ObfuscationError::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }

    /// Whether `path` carries a supported extension.
    pub fn is_supported_path(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }

    fn as_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
            Self::Gif => write!(f, "GIF"),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodeOptions {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// NeuQuant speed used when reducing a frame to a 256-color palette.
    pub gif_speed: i32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: std::env::var("SPECTER_JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|q| (1..=100).contains(q))
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            gif_speed: DEFAULT_GIF_SPEED,
        }
    }
}

// Truncated or malformed streams surface as I/O errors from some decoders.
fn decode_error(err: ImageError) -> ObfuscationError {
    match err {
        ImageError::IoError(e)
            if !matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData
            ) =>
        {
            ObfuscationError::Io(e)
        }
        other => ObfuscationError::DecodeFailure(other.to_string()),
    }
}

fn encode_error(err: ImageError) -> ObfuscationError {
    ObfuscationError::EncodeFailure(err.to_string())
}

/// Decode an image file. Multi-frame GIFs are rejected.
pub fn decode(path: &Path, format: ImageFormat) -> Result<RasterImage> {
    let file = File::open(path)?;
    decode_reader(BufReader::new(file), format)
}

/// Decode an image from a reader.
pub fn decode_reader<R: BufRead + Seek>(reader: R, format: ImageFormat) -> Result<RasterImage> {
    let image = match format {
        ImageFormat::Gif => {
            let decoder = GifDecoder::new(reader).map_err(decode_error)?;
            // Stop at the second frame; the rest of an animation is never decoded.
            let mut frames = decoder.into_frames();
            let first = frames
                .next()
                .transpose()
                .map_err(decode_error)?
                .ok_or_else(|| ObfuscationError::DecodeFailure("GIF has no frames".into()))?;
            if frames.next().is_some() {
                return Err(ObfuscationError::AnimatedImageUnsupported { frames: 2 });
            }
            DynamicImage::ImageRgba8(first.into_buffer())
        }
        other => image::load(reader, other.as_image_format()).map_err(decode_error)?,
    };

    debug!(
        format = %format,
        width = image.width(),
        height = image.height(),
        "Decoded image"
    );
    Ok(RasterImage::from_dynamic(&image))
}

/// Encode `image` to `path`, creating or truncating the file.
///
/// The file is written in place; an encoder failure can leave a partially
/// written file behind.
pub fn encode(
    image: &RasterImage,
    format: ImageFormat,
    path: &Path,
    options: &EncodeOptions,
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_writer(image, format, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Encode `image` into a writer.
pub fn encode_writer<W: Write>(
    image: &RasterImage,
    format: ImageFormat,
    writer: W,
    options: &EncodeOptions,
) -> Result<()> {
    let dynamic = image.to_dynamic();
    match format {
        ImageFormat::Png => dynamic
            .write_with_encoder(PngEncoder::new(writer))
            .map_err(encode_error)?,
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(dynamic.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, options.jpeg_quality))
                .map_err(encode_error)?
        }
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new_with_speed(writer, options.gif_speed);
            encoder
                .encode_frame(Frame::new(dynamic.to_rgba8()))
                .map_err(encode_error)?
        }
    }
    debug!(format = %format, "Encoded image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Delay, Rgba, RgbaImage};
    use std::io::Cursor;

    fn sample(width: usize, height: usize) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| {
            let v = ((x + y) * 257 * 16) as u16;
            [v, v / 2, 65535 - v, 65535]
        })
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ImageFormat::from_path(Path::new("a/b.PNG")).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("x.Jpeg")).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("x.jpg")).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("x.gif")).unwrap(),
            ImageFormat::Gif
        );
    }

    #[test]
    fn test_unsupported_extensions() {
        for name in ["x.bmp", "x.webp", "noext", "x.png.txt"] {
            assert!(
                matches!(
                    ImageFormat::from_path(Path::new(name)),
                    Err(ObfuscationError::UnsupportedFormat { .. })
                ),
                "{name} should be rejected"
            );
        }
        assert!(!ImageFormat::is_supported_path(Path::new("photo.tiff")));
    }

    #[test]
    fn test_png_keeps_16bit_samples() {
        let image = sample(8, 8);
        let mut buffer = Cursor::new(Vec::new());
        encode_writer(&image, ImageFormat::Png, &mut buffer, &EncodeOptions::default()).unwrap();

        buffer.set_position(0);
        let decoded = decode_reader(buffer, ImageFormat::Png).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_jpeg_encodes_and_decodes() {
        let image = sample(16, 16);
        let mut buffer = Cursor::new(Vec::new());
        encode_writer(&image, ImageFormat::Jpeg, &mut buffer, &EncodeOptions::default()).unwrap();

        buffer.set_position(0);
        let decoded = decode_reader(buffer, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_single_frame_gif_decodes() {
        let image = sample(10, 6);
        let mut buffer = Cursor::new(Vec::new());
        encode_writer(&image, ImageFormat::Gif, &mut buffer, &EncodeOptions::default()).unwrap();

        buffer.set_position(0);
        let decoded = decode_reader(buffer, ImageFormat::Gif).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 6));
    }

    #[test]
    fn test_animated_gif_rejected() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = GifEncoder::new(&mut buffer);
            for shade in [0u8, 255] {
                let frame = RgbaImage::from_pixel(4, 4, Rgba([shade, shade, shade, 255]));
                encoder
                    .encode_frame(Frame::from_parts(frame, 0, 0, Delay::from_numer_denom_ms(100, 1)))
                    .unwrap();
            }
        }

        buffer.set_position(0);
        assert!(matches!(
            decode_reader(buffer, ImageFormat::Gif),
            Err(ObfuscationError::AnimatedImageUnsupported { frames: 2 })
        ));
    }

    #[test]
    fn test_animated_gif_rejected_before_later_frames() {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            for shade in [0u8, 90, 180] {
                let frame = RgbaImage::from_fn(16, 16, |x, y| {
                    let v = shade.wrapping_add((x * 13 + y * 7) as u8);
                    Rgba([v, v / 2, 255 - v, 255])
                });
                encoder
                    .encode_frame(Frame::from_parts(frame, 0, 0, Delay::from_numer_denom_ms(100, 1)))
                    .unwrap();
            }
        }
        // Cut into the third frame: only the first two are ever read.
        bytes.truncate(bytes.len() - 8);

        assert!(matches!(
            decode_reader(Cursor::new(bytes), ImageFormat::Gif),
            Err(ObfuscationError::AnimatedImageUnsupported { frames: 2 })
        ));
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let buffer = Cursor::new(b"definitely not a png".to_vec());
        assert!(matches!(
            decode_reader(buffer, ImageFormat::Png),
            Err(ObfuscationError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            decode(Path::new("/nonexistent/specter/x.png"), ImageFormat::Png),
            Err(ObfuscationError::Io(_))
        ));
    }
}
