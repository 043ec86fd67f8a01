//! Review orchestrator.
//!
//! Grades a batch of tasks one at a time and, for each, applies the verdict
//! on the tracker: approved tasks are completed (and commented), rejected
//! tasks receive a comment listing the corrections. A tracker failure on one
//! task is recorded and the batch moves on.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TrackerError;
use crate::feedback::compose_comment;
use crate::grader::Grader;
use crate::model::{TaskRecord, DEFAULT_APPROVAL_THRESHOLD};
use crate::report::{ReviewReport, TaskOutcome, TaskReview};
use crate::results::Verdict;
use crate::traits::TaskTracker;

/// Configuration for the review engine.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Minimum score for approval.
    pub approval_threshold: f64,
    /// Grade only; never touch the tracker.
    pub dry_run: bool,
    /// Also post the report comment on approved tasks.
    pub comment_on_pass: bool,
    /// Retries on transient tracker errors.
    pub max_retries: u32,
    /// Initial delay between retries.
    pub retry_delay: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            dry_run: false,
            comment_on_pass: true,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_task_start(&self, task: &TaskRecord);
    fn on_task_graded(&self, review: &TaskReview);
    fn on_task_error(&self, task: &TaskRecord, error: &str);
    fn on_batch_complete(&self, total: usize, approved: usize, errored: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_task_start(&self, _: &TaskRecord) {}
    fn on_task_graded(&self, _: &TaskReview) {}
    fn on_task_error(&self, _: &TaskRecord, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Grades tasks and applies verdicts on a tracker.
pub struct ReviewEngine {
    grader: Grader,
    tracker: Option<Arc<dyn TaskTracker>>,
    config: ReviewConfig,
}

impl ReviewEngine {
    /// An engine without a tracker only grades and composes comments.
    pub fn new(grader: Grader, config: ReviewConfig) -> Self {
        Self {
            grader,
            tracker: None,
            config,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn TaskTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Review tasks sequentially, in the given order.
    pub async fn review(&self, tasks: &[TaskRecord], progress: &dyn ProgressReporter) -> ReviewReport {
        let start = Instant::now();
        let mut reviews = Vec::with_capacity(tasks.len());

        for task in tasks {
            progress.on_task_start(task);
            let review = self.review_task(task).await;
            if let TaskOutcome::Errored { message } = &review.outcome {
                tracing::error!("tracker action failed for task {}: {message}", task.gid);
                progress.on_task_error(task, message);
            }
            progress.on_task_graded(&review);
            reviews.push(review);
        }

        let elapsed = start.elapsed();
        let report = ReviewReport::new(
            self.grader.key(),
            self.config.approval_threshold,
            self.acts_on_tracker().is_none(),
            reviews,
            elapsed.as_millis() as u64,
        );
        progress.on_batch_complete(
            report.summary.total,
            report.summary.approved,
            report.summary.errored,
            elapsed,
        );
        report
    }

    async fn review_task(&self, task: &TaskRecord) -> TaskReview {
        let result = self.grader.grade_fields(&task.fields);
        let verdict = Verdict::decide(&result, self.config.approval_threshold);
        let comment = compose_comment(&result, verdict);
        tracing::debug!(
            task = %task.gid,
            score = result.score,
            %verdict,
            "graded task"
        );

        let outcome = match self.acts_on_tracker() {
            Some(tracker) => match self.apply(tracker.as_ref(), task, verdict, &comment).await {
                Ok(outcome) => outcome,
                Err(e) => TaskOutcome::Errored {
                    message: e.to_string(),
                },
            },
            None => TaskOutcome::Skipped,
        };

        TaskReview {
            gid: task.gid.clone(),
            name: task.name.clone(),
            assignee: task.assignee.clone(),
            result,
            verdict,
            comment,
            outcome,
        }
    }

    fn acts_on_tracker(&self) -> Option<&Arc<dyn TaskTracker>> {
        if self.config.dry_run {
            None
        } else {
            self.tracker.as_ref()
        }
    }

    async fn apply(
        &self,
        tracker: &dyn TaskTracker,
        task: &TaskRecord,
        verdict: Verdict,
        comment: &str,
    ) -> Result<TaskOutcome, TrackerError> {
        match verdict {
            Verdict::Approved => {
                self.with_retries(|| tracker.complete_task(&task.gid)).await?;
                tracing::info!("completed task {} ({})", task.gid, task.name);
                if self.config.comment_on_pass {
                    self.with_retries(|| tracker.post_comment(&task.gid, comment))
                        .await?;
                }
                Ok(TaskOutcome::Completed)
            }
            Verdict::Rejected => {
                self.with_retries(|| tracker.post_comment(&task.gid, comment))
                    .await?;
                tracing::info!("posted corrections on task {} ({})", task.gid, task.name);
                Ok(TaskOutcome::Commented)
            }
        }
    }

    /// Run a tracker call, retrying transient failures with exponential backoff.
    async fn with_retries<T, F, Fut>(&self, mut call: F) -> Result<T, TrackerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TrackerError>>,
    {
        let mut delay = self.config.retry_delay;
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_permanent() || attempt >= self.config.max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let wait = e
                        .retry_after_ms()
                        .map(Duration::from_millis)
                        .unwrap_or(delay);
                    tracing::warn!(
                        "tracker call failed ({e}), retry {attempt}/{} in {}ms",
                        self.config.max_retries,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                    delay = (delay * 2).min(Duration::from_secs(60));
                }
            }
        }
    }
}
