//! Exit codes following sysexits.h conventions.
//!
//! These codes provide semantic meaning for different failure modes,
//! enabling scripts and CI systems to handle errors appropriately.

use specter_core::ObfuscationError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all), also used when some batch jobs failed.
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (unsupported, animated or malformed image).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Required external tool unavailable.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// Internal contract violation.
/// Maps to EX_SOFTWARE from sysexits.h.
pub const INTERNAL_ERROR: i32 = 70;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Typed library errors first, then the context messages added here.
        let code = match err.chain().find_map(|e| e.downcast_ref::<ObfuscationError>()) {
            Some(e) => Self::classify(e),
            None if message.starts_with("Invalid usage") => USAGE_ERROR,
            None if message.contains("Failed to access source") => INPUT_ERROR,
            None if message.contains("Failed to write") => IO_ERROR,
            None => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(message),
        }
    }

    fn classify(err: &ObfuscationError) -> i32 {
        match err {
            ObfuscationError::UnsupportedFormat { .. }
            | ObfuscationError::AnimatedImageUnsupported { .. }
            | ObfuscationError::DecodeFailure(_) => DATA_ERROR,
            ObfuscationError::MissingDependency { .. } => UNAVAILABLE,
            ObfuscationError::TransformNotPerformed
            | ObfuscationError::CoordinateOutOfRange { .. } => INTERNAL_ERROR,
            ObfuscationError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => INPUT_ERROR,
            ObfuscationError::Io(_) | ObfuscationError::EncodeFailure(_) => IO_ERROR,
            ObfuscationError::Job(_) => GENERAL_ERROR,
        }
    }
}
