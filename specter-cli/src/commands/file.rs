//! Single-file obfuscation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use specter_core::{obfuscate_file, ImageFormat, ObfuscationConfig, ObfuscationOutcome};
use tracing::{debug, info, instrument};

use crate::tools;
use crate::Cli;

/// Outcome of the size-reduction check on a written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePass {
    /// Size of the obfuscated file before any shrinking.
    pub result_bytes: u64,
    /// Whether the shrink tool was run.
    pub ran: bool,
}

/// Run the pngquant pre-pass when a PNG is obfuscated in place.
pub async fn prepare(input: &Path, output: &Path, format: ImageFormat) {
    if format == ImageFormat::Png && input == output {
        debug!("Running pngquant pre-pass");
        tools::prepass(input).await;
    }
}

/// Shrink `output` if the obfuscated file exceeds the size threshold.
pub async fn shrink_if_large(
    output: &Path,
    format: ImageFormat,
) -> specter_core::Result<SizePass> {
    let result_bytes = std::fs::metadata(output)?.len();
    let ran = tools::needs_shrink(result_bytes);
    if ran {
        debug!(result_bytes, "Running size-reduction pass");
        tools::shrink(format, output).await;
    }
    Ok(SizePass { result_bytes, ran })
}

/// Obfuscate one image, including the optional recompression passes.
///
/// Unsupported and animated images fail before any tool runs or any file is
/// written. Returns the size check when recompression is enabled.
#[instrument(level = "debug", skip_all, fields(input = %input.display()))]
pub async fn obfuscate_one(
    input: &Path,
    output: &Path,
    config: ObfuscationConfig,
    recompress: bool,
) -> Result<(ObfuscationOutcome, Option<SizePass>)> {
    let format = ImageFormat::from_path(input)?;
    if recompress {
        prepare(input, output, format).await;
    }

    let (input_owned, output_owned) = (input.to_path_buf(), output.to_path_buf());
    let outcome =
        tokio::task::spawn_blocking(move || obfuscate_file(&input_owned, &output_owned, &config))
            .await
            .context("Obfuscation worker panicked")?
            .with_context(|| format!("Failed to obfuscate {}", input.display()))?;

    let size_pass = if recompress {
        Some(
            shrink_if_large(output, format)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?,
        )
    } else {
        None
    };

    Ok((outcome, size_pass))
}

/// Execute single-file mode.
pub async fn execute(cli: &Cli) -> Result<()> {
    let output: PathBuf = cli.output.clone().unwrap_or_else(|| cli.source.clone());
    let config = super::obfuscation_config(cli);

    let (outcome, _) = obfuscate_one(&cli.source, &output, config, !cli.skip_recompress).await?;
    let written = std::fs::metadata(&output).map(|m| m.len()).ok();

    info!(
        source = %cli.source.display(),
        output = %output.display(),
        samples = outcome.perturbation.samples_per_channel,
        "Done"
    );

    if cli.json {
        let report = serde_json::json!({
            "source": cli.source,
            "output": output,
            "bytes_written": written,
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        println!();
        println!("{}", "Image obfuscated".green().bold());
        println!();
        println!("   {} {}", "Source:".dimmed(), cli.source.display());
        if output != cli.source {
            println!("   {} {}", "Output:".dimmed(), output.display());
        }
        println!(
            "   {} {} {}x{}",
            "Image:".dimmed(),
            outcome.format,
            outcome.width,
            outcome.height
        );
        println!(
            "   {} {} per channel",
            "Coefficients:".dimmed(),
            outcome.perturbation.samples_per_channel
        );
        if let Some(bytes) = written {
            println!("   {} {} bytes", "Size:".dimmed(), bytes);
        }
        println!();
    }

    Ok(())
}
