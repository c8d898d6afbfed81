//! External lossy-recompression tools.
//!
//! `pngquant` and `jpegoptim` shrink large outputs after obfuscation. They are
//! collaborators, not part of the obfuscation itself: their failures are
//! logged and otherwise ignored.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use rand::Rng;
use specter_core::{ImageFormat, ObfuscationError};
use tokio::process::Command;
use tracing::{debug, warn};

pub const PNGQUANT: &str = "pngquant";
pub const JPEGOPTIM: &str = "jpegoptim";

/// Tools that must be on `PATH` before any image is processed.
pub const REQUIRED_TOOLS: [&str; 2] = [PNGQUANT, JPEGOPTIM];

/// Obfuscated files larger than this are shrunk.
pub const SHRINK_THRESHOLD_BYTES: u64 = 64 * 1024;

/// Whether an obfuscated file of `bytes` gets the size-reduction pass.
pub fn needs_shrink(bytes: u64) -> bool {
    bytes > SHRINK_THRESHOLD_BYTES
}

/// Locate `tool` in the directories listed in `PATH`.
pub fn find_on_path(tool: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// Fail with `MissingDependency` if any required tool is absent.
pub fn preflight() -> Result<(), ObfuscationError> {
    for tool in REQUIRED_TOOLS {
        match find_on_path(tool) {
            Some(path) => debug!(tool, path = %path.display(), "Found dependency"),
            None => {
                return Err(ObfuscationError::MissingDependency {
                    tool: tool.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Arguments for the lossless-ish pngquant pass run before obfuscation.
pub fn prepass_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["--strip", "--skip-if-larger", "--ext=.png", "--force"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.into());
    args
}

/// Tool and arguments for the size-reduction pass, with a randomized quality.
///
/// Returns `None` for formats without a shrink step.
pub fn shrink_command<R: Rng>(
    format: ImageFormat,
    path: &Path,
    rng: &mut R,
) -> Option<(&'static str, Vec<OsString>)> {
    match format {
        ImageFormat::Png => {
            let quality = format!("0-{}", rng.gen_range(90..100));
            let mut args = prepass_args(path);
            args.insert(args.len() - 1, "--quality".into());
            args.insert(args.len() - 1, quality.into());
            Some((PNGQUANT, args))
        }
        ImageFormat::Jpeg => {
            let max_quality = rng.gen_range(80..100).to_string();
            Some((
                JPEGOPTIM,
                vec![
                    "--strip".into(),
                    "-m".into(),
                    max_quality.into(),
                    path.into(),
                ],
            ))
        }
        ImageFormat::Gif => None,
    }
}

/// Run the pngquant pre-pass on `path`.
pub async fn prepass(path: &Path) {
    run(PNGQUANT, prepass_args(path)).await;
}

/// Run the size-reduction pass on `path`.
pub async fn shrink(format: ImageFormat, path: &Path) {
    let command = shrink_command(format, path, &mut rand::thread_rng());
    if let Some((tool, args)) = command {
        run(tool, args).await;
    }
}

async fn run(tool: &str, args: Vec<OsString>) {
    let status = Command::new(tool)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => debug!(tool, "Recompression pass finished"),
        // pngquant exits non-zero when --skip-if-larger declines to write.
        Ok(status) => debug!(tool, %status, "Recompression pass made no change"),
        Err(e) => warn!(tool, error = %e, "Failed to run recompression tool"),
    }
}
