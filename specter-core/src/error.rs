use thiserror::Error;

use crate::spectrum::Channel;

#[derive(Error, Debug)]
pub enum ObfuscationError {
    #[error("Unsupported image format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("Animated image not supported (at least {frames} frames)")]
    AnimatedImageUnsupported { frames: usize },

    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Encode failure: {0}")]
    EncodeFailure(String),

    #[error("Transform not performed: run the forward transform before accessing coefficients")]
    TransformNotPerformed,

    #[error("Coefficient ({x}, {y}) out of range for {channel} spectrum of {width}x{height}")]
    CoordinateOutOfRange {
        channel: Channel,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing dependency: {tool} not found on PATH")]
    MissingDependency { tool: String },

    #[error("Job failed: {0}")]
    Job(String),
}

pub type Result<T> = std::result::Result<T, ObfuscationError>;
