//! Specter CLI - frequency-domain image obfuscation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use specter_core::batch::DEFAULT_PARALLELISM;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit_codes;
mod tools;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error, or at least one image in a directory failed
  64  Usage error
  65  Unsupported, animated or malformed image
  66  Source not found
  69  pngquant or jpegoptim not installed
  70  Internal error
  74  Failed to write output";

#[derive(Parser, Debug, Clone)]
#[command(name = "specter")]
#[command(author, version, about = "Frequency-domain image obfuscation", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
pub struct Cli {
    /// Image file or directory to obfuscate (directories are walked recursively)
    #[arg(short, long, value_name = "PATH")]
    source: PathBuf,

    /// Maximum number of images processed at once in directory mode
    #[arg(short = 't', long, value_name = "N", default_value_t = DEFAULT_PARALLELISM)]
    parallel: usize,

    /// Write the result here instead of overwriting the source (file mode only)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Process a directory on worker threads instead of child processes
    #[arg(long)]
    in_process: bool,

    /// Skip the pngquant and jpegoptim passes
    #[arg(long)]
    skip_recompress: bool,

    /// Seed the perturbation RNG for reproducible output
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Suppress human-readable output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "specter=debug,specter_core=debug"
    } else {
        "specter=info,specter_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.parallel == 0 {
        bail!("Invalid usage: --parallel must be at least 1");
    }
    let metadata = std::fs::metadata(&cli.source)
        .with_context(|| format!("Failed to access source: {}", cli.source.display()))?;

    if !cli.skip_recompress {
        tools::preflight()?;
    }

    if metadata.is_dir() {
        if cli.output.is_some() {
            bail!("Invalid usage: --output requires a file source");
        }
        commands::batch::execute(&cli).await
    } else if metadata.is_file() {
        commands::file::execute(&cli).await
    } else {
        bail!(
            "Failed to access source: {} is neither a file nor a directory",
            cli.source.display()
        )
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(e) => ExitCode::from_anyhow(&e),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
