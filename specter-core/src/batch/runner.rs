//! Job execution strategies.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::Job;
use crate::error::{ObfuscationError, Result};
use crate::pipeline::{obfuscate_file, ObfuscationConfig};

/// Executes one [`Job`].
///
/// Implementations must be thread-safe (`Send + Sync`); one runner is shared
/// by every worker of a batch.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &Job) -> Result<()>;
}

/// Runs each job in a freshly spawned process.
///
/// The child is invoked as `<program> <base args...> --source <input>
/// --output <output>` and must exit with status zero on success.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    base_args: Vec<OsString>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Re-invoke the currently running executable.
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    /// Arguments placed before the per-job arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command that would run `job`.
    pub fn command(&self, job: &Job) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .arg("--source")
            .arg(&job.input)
            .arg("--output")
            .arg(&job.output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

#[async_trait]
impl JobRunner for ProcessRunner {
    #[instrument(level = "debug", skip_all, fields(input = %job.input.display()))]
    async fn run(&self, job: &Job) -> Result<()> {
        let output = self.command(job).output().await?;
        if output.status.success() {
            debug!("Child process succeeded");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().last().unwrap_or_default().trim();
        Err(ObfuscationError::Job(if detail.is_empty() {
            format!("child exited with {}", output.status)
        } else {
            format!("child exited with {}: {detail}", output.status)
        }))
    }
}

/// Runs each job on the blocking thread pool of the current runtime.
///
/// Every job builds its own transform engine, and engines are never shared
/// between threads.
#[derive(Debug, Clone, Default)]
pub struct InProcessRunner {
    config: ObfuscationConfig,
}

impl InProcessRunner {
    pub fn new(config: ObfuscationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl JobRunner for InProcessRunner {
    async fn run(&self, job: &Job) -> Result<()> {
        let job = job.clone();
        let config = self.config;
        tokio::task::spawn_blocking(move || obfuscate_file(&job.input, &job.output, &config))
            .await
            .map_err(|e| ObfuscationError::Job(format!("worker thread failed: {e}")))??;
        Ok(())
    }
}
