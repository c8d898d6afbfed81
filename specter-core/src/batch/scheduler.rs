//! Bounded worker pool draining a job queue.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{BatchReport, FailedJob, Job, JobRunner};

/// Default number of concurrent workers.
pub const DEFAULT_PARALLELISM: usize = 10;

/// Fans jobs out to a fixed number of workers.
#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    parallelism: usize,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLELISM)
    }
}

impl BatchScheduler {
    /// A scheduler running at most `parallelism` jobs at once (minimum 1).
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Run every job and wait for all workers to drain the queue.
    ///
    /// Per-job failures are logged and collected in the report; they never
    /// stop the remaining jobs.
    pub async fn run(&self, jobs: Vec<Job>, runner: Arc<dyn JobRunner>) -> BatchReport {
        let total = jobs.len();
        let (tx, rx) = mpsc::channel::<Job>(self.parallelism);
        let rx = Arc::new(Mutex::new(rx));

        info!(total, parallelism = self.parallelism, "Starting batch");

        let producer = tokio::spawn(async move {
            for job in jobs {
                if tx.send(job).await.is_err() {
                    break;
                }
            }
            // Dropping the sender closes the queue.
        });

        let mut workers = JoinSet::new();
        for worker in 0..self.parallelism {
            let rx = Arc::clone(&rx);
            let runner = Arc::clone(&runner);
            workers.spawn(async move {
                let mut failed = Vec::new();
                let mut succeeded = 0usize;
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(job) = next else { break };

                    match runner.run(&job).await {
                        Ok(()) => {
                            debug!(worker, input = %job.input.display(), "Job succeeded");
                            succeeded += 1;
                        }
                        Err(e) => {
                            warn!(worker, input = %job.input.display(), error = %e, "Job failed");
                            failed.push(FailedJob {
                                input: job.input,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                (succeeded, failed)
            });
        }

        let mut report = BatchReport {
            total,
            ..Default::default()
        };
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((succeeded, failed)) => {
                    report.succeeded += succeeded;
                    report.failed.extend(failed);
                }
                Err(e) => warn!(error = %e, "Worker terminated abnormally"),
            }
        }
        if let Err(e) = producer.await {
            warn!(error = %e, "Job producer terminated abnormally");
        }

        info!(
            total,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Batch complete"
        );
        report
    }
}
