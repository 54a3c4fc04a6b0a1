//! Background completion of every pending item of a list.
//!
//! Requests enqueue a [`CompleteListJob`] through a [`JobQueue`] and return at once.
//! A single [`ListCompleter`] consumes the queue, retrying storage failures up to
//! `max_attempts` times. A list that no longer exists is not retried.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{self, Config};
use crate::list::{CompletionReport, ListId, ListService, ListServiceError};
use crate::repo::Repository;

/// Name of the queue carrying list completion jobs, used in logs.
pub const LIST_COMPLETER_QUEUE: &str = "list_completer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: config::default_job_queue_capacity(),
            max_attempts: config::default_job_max_attempts(),
            retry_delay: Duration::from_millis(config::default_job_retry_delay_ms()),
        }
    }
}

impl From<&Config> for WorkerConfig {
    fn from(config: &Config) -> Self {
        Self {
            queue_capacity: config.job_queue_capacity,
            max_attempts: config.job_max_attempts,
            retry_delay: Duration::from_millis(config.job_retry_delay_ms),
        }
    }
}

/// Request to complete every pending item of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteListJob {
    pub list_id: ListId,
    pub attempt: u32,
}

impl CompleteListJob {
    pub fn new(list_id: ListId) -> Self {
        Self {
            list_id,
            attempt: 1,
        }
    }

    fn retry(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// Error type for enqueueing jobs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("The list_completer queue is full")]
    Full,
    #[error("The list_completer queue is closed")]
    Closed,
}

/// Producer side of the list completion queue.
#[derive(Clone, Debug)]
pub struct JobQueue {
    sender: mpsc::Sender<CompleteListJob>,
}

impl JobQueue {
    /// Enqueues completion of every pending item of `list_id` without waiting for it.
    ///
    /// The list is not looked up here; a missing list is reported by the worker.
    #[tracing::instrument(skip(self))]
    pub fn enqueue_complete_list(&self, list_id: ListId) -> Result<(), QueueError> {
        self.sender
            .try_send(CompleteListJob::new(list_id))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            })?;
        tracing::info!("Enqueued completion of list {} on {}", list_id, LIST_COMPLETER_QUEUE);
        Ok(())
    }
}

/// What happened to a job after one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The list was processed; `failed` counts items that could not be completed.
    Completed { completed: usize, failed: usize },
    /// A storage failure occurred and the job was scheduled again.
    Retrying { next_attempt: u32 },
    /// The list does not exist; the job was dropped.
    ListNotFound,
    /// Every attempt failed; the job was dropped.
    GaveUp { attempts: u32 },
}

/// Completes every pending item of a list.
///
/// This is the unit of work behind each job and can be called directly.
pub async fn complete_all_pending<R: Repository + ?Sized>(
    repo: &R,
    list_id: ListId,
) -> Result<CompletionReport, ListServiceError> {
    ListService::new(repo).complete_list(list_id).await
}

/// Consumer side of the list completion queue.
pub struct ListCompleter {
    repo: Arc<dyn Repository>,
    receiver: mpsc::Receiver<CompleteListJob>,
    retry_sender: mpsc::WeakSender<CompleteListJob>,
    config: WorkerConfig,
}

impl ListCompleter {
    /// Creates a queue and the worker consuming it.
    ///
    /// The worker only holds a weak handle to the queue, so it stops once every
    /// [`JobQueue`] clone has been dropped and the queue is drained.
    pub fn new(repo: Arc<dyn Repository>, config: WorkerConfig) -> (JobQueue, Self) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let retry_sender = sender.downgrade();
        let completer = Self {
            repo,
            receiver,
            retry_sender,
            config,
        };
        (JobQueue { sender }, completer)
    }

    /// Processes jobs until the queue is closed.
    #[tracing::instrument(skip(self))]
    pub async fn run(mut self) {
        tracing::info!("Worker for {} started", LIST_COMPLETER_QUEUE);
        while self.run_once().await.is_some() {}
        tracing::info!("Worker for {} stopped", LIST_COMPLETER_QUEUE);
    }

    /// Waits for the next job and processes it. Returns `None` once the queue is closed.
    pub async fn run_once(&mut self) -> Option<JobOutcome> {
        let job = self.receiver.recv().await?;
        Some(self.perform(job).await)
    }

    #[tracing::instrument(skip(self))]
    async fn perform(&self, job: CompleteListJob) -> JobOutcome {
        tracing::info!(
            "Processing completion of list {} (attempt {})",
            job.list_id,
            job.attempt
        );
        match complete_all_pending(self.repo.as_ref(), job.list_id).await {
            Ok(report) => {
                for failure in report.failures() {
                    tracing::warn!(
                        "Item {} of list {} was not completed: {}",
                        failure.item_id,
                        report.list_id(),
                        failure.error
                    );
                }
                JobOutcome::Completed {
                    completed: report.completed().len(),
                    failed: report.failures().len(),
                }
            }
            Err(ListServiceError::ListNotFound(list_id)) => {
                tracing::error!(
                    "Dropping job for list {}: list not found (attempt {})",
                    list_id,
                    job.attempt
                );
                JobOutcome::ListNotFound
            }
            Err(err) if job.attempt < self.config.max_attempts => {
                let next = job.retry();
                tracing::warn!(
                    "Attempt {} for list {} failed: {}; retrying in {:?}",
                    job.attempt,
                    job.list_id,
                    err,
                    self.config.retry_delay
                );
                self.schedule_retry(next);
                JobOutcome::Retrying {
                    next_attempt: next.attempt,
                }
            }
            Err(err) => {
                tracing::error!(
                    "Giving up on list {} after {} attempt(s): {}",
                    job.list_id,
                    job.attempt,
                    err
                );
                JobOutcome::GaveUp {
                    attempts: job.attempt,
                }
            }
        }
    }

    fn schedule_retry(&self, job: CompleteListJob) {
        let retry_sender = self.retry_sender.clone();
        let delay = self.config.retry_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(sender) = retry_sender.upgrade() else {
                tracing::warn!("Queue closed before retrying list {}", job.list_id);
                return;
            };
            if sender.send(job).await.is_err() {
                tracing::warn!("Queue closed before retrying list {}", job.list_id);
            }
        });
    }
}

/// Starts a [`ListCompleter`] on its own task and returns the queue feeding it.
pub fn spawn_list_completer(
    repo: Arc<dyn Repository>,
    config: WorkerConfig,
) -> (JobQueue, JoinHandle<()>) {
    let (queue, completer) = ListCompleter::new(repo, config);
    let handle = tokio::spawn(completer.run());
    (queue, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_matches_config_defaults() {
        let source = HashMap::from([(
            "DB_URL".to_string(),
            "postgres://localhost/todo".to_string(),
        )]);
        let config =
            Config::from_environment(::config::Environment::default().source(Some(source)))
                .unwrap();

        assert_eq!(WorkerConfig::default(), WorkerConfig::from(&config));
    }
}
