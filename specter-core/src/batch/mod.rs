//! Batch obfuscation across many files.
//!
//! A producer pushes [`Job`]s into a bounded queue sized to the parallelism
//! limit and closes it once every job is enqueued. A fixed pool of workers
//! drains the queue, handing each job to a [`JobRunner`]. The default runner
//! ([`ProcessRunner`]) executes every job in a freshly spawned OS process, so
//! no transform state is ever shared between jobs.
//!
//! Jobs are independent: they run in no particular order, are never retried,
//! and one job's failure never stops the others. There is no timeout; a hung
//! job occupies its worker slot until it exits.

mod runner;
mod scheduler;

pub use runner::{InProcessRunner, JobRunner, ProcessRunner};
pub use scheduler::{BatchScheduler, DEFAULT_PARALLELISM};

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::codec::ImageFormat;

/// One unit of work: obfuscate `input` into `output`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// A job that overwrites its own input.
    pub fn in_place(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            output: path.clone(),
            input: path,
        }
    }
}

/// A job that did not complete.
#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub input: PathBuf,
    pub error: String,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<FailedJob>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Recursively find every regular file (or symlink to one) under `root` with
/// a supported image extension. Unreadable entries are logged and skipped.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        // Symlinks to files are processed; directory symlinks are not walked.
        let is_file = if entry.path_is_symlink() {
            entry.path().is_file()
        } else {
            entry.file_type().is_file()
        };
        if is_file && ImageFormat::is_supported_path(entry.path()) {
            files.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), count = files.len(), "Discovered image files");
    files
}

/// One in-place job per discovered image under `root`.
pub fn discover_jobs(root: &Path) -> Vec<Job> {
    discover(root).into_iter().map(Job::in_place).collect()
}
