//! Directory mode.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use specter_core::batch::{
    discover_jobs, BatchScheduler, InProcessRunner, Job, JobRunner, ProcessRunner,
};
use specter_core::ImageFormat;
use tracing::info;

use super::file;
use crate::Cli;

/// Runs jobs through [`InProcessRunner`], adding the recompression passes a
/// child process would apply.
struct LocalRunner {
    inner: InProcessRunner,
    recompress: bool,
}

#[async_trait]
impl JobRunner for LocalRunner {
    async fn run(&self, job: &Job) -> specter_core::Result<()> {
        if !self.recompress {
            return self.inner.run(job).await;
        }
        let format = ImageFormat::from_path(&job.input)?;
        file::prepare(&job.input, &job.output, format).await;
        self.inner.run(job).await?;
        file::shrink_if_large(&job.output, format).await?;
        Ok(())
    }
}

/// Arguments forwarded to every child process.
fn child_args(cli: &Cli) -> Vec<String> {
    let mut args = vec!["--quiet".to_string()];
    if cli.skip_recompress {
        args.push("--skip-recompress".into());
    }
    if cli.verbose {
        args.push("--verbose".into());
    }
    if let Some(seed) = cli.seed {
        args.push("--seed".into());
        args.push(seed.to_string());
    }
    args
}

fn runner(cli: &Cli) -> Result<Arc<dyn JobRunner>> {
    if cli.in_process {
        return Ok(Arc::new(LocalRunner {
            inner: InProcessRunner::new(super::obfuscation_config(cli)),
            recompress: !cli.skip_recompress,
        }));
    }
    let runner = ProcessRunner::current_exe()
        .context("Failed to locate the specter executable")?
        .with_args(child_args(cli));
    Ok(Arc::new(runner))
}

/// Execute directory mode.
pub async fn execute(cli: &Cli) -> Result<()> {
    let jobs = discover_jobs(&cli.source);
    info!(
        root = %cli.source.display(),
        images = jobs.len(),
        parallel = cli.parallel,
        in_process = cli.in_process,
        "Discovered images"
    );

    let report = BatchScheduler::new(cli.parallel)
        .run(jobs, runner(cli)?)
        .await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        println!();
        let headline = format!(
            "{} of {} images obfuscated",
            report.succeeded, report.total
        );
        if report.is_success() {
            println!("{}", headline.green().bold());
        } else {
            println!("{}", headline.yellow().bold());
            println!();
            for failure in &report.failed {
                println!(
                    "   {} {}: {}",
                    "✗".red(),
                    failure.input.display(),
                    failure.error
                );
            }
        }
        println!();
    }

    if !report.is_success() {
        bail!(
            "{} of {} images failed",
            report.failed.len(),
            report.total
        );
    }
    Ok(())
}
