//! Review report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::AnswerKey;
use crate::results::{GradingResult, Verdict};
use crate::statistics::{compute_question_stats, summarize, QuestionStats, ReviewSummary};

/// A complete review of one batch of tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Answer key the tasks were graded against.
    pub answer_key: AnswerKeySummary,
    /// Score needed for approval.
    pub approval_threshold: f64,
    /// Whether tracker actions were skipped.
    pub dry_run: bool,
    /// Per-task reviews, in processing order.
    pub tasks: Vec<TaskReview>,
    pub summary: ReviewSummary,
    /// Per-question statistics, in answer-key order.
    pub question_stats: Vec<QuestionStats>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an answer key (without the answers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerKeySummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl From<&AnswerKey> for AnswerKeySummary {
    fn from(key: &AnswerKey) -> Self {
        Self {
            id: key.id().to_string(),
            name: key.name().to_string(),
            question_count: key.len(),
        }
    }
}

/// The grading and follow-up of a single task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReview {
    pub gid: String,
    pub name: String,
    #[serde(default)]
    pub assignee: Option<String>,
    pub result: GradingResult,
    pub verdict: Verdict,
    /// Comment composed for the task.
    pub comment: String,
    pub outcome: TaskOutcome,
}

/// What happened on the tracker after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Approved: marked complete (and commented, if configured).
    Completed,
    /// Rejected: comment posted.
    Commented,
    /// No tracker actions were taken.
    Skipped,
    /// A tracker action failed.
    Errored { message: String },
}

impl ReviewReport {
    /// Build a report, computing the summary and per-question statistics.
    pub fn new(
        key: &AnswerKey,
        approval_threshold: f64,
        dry_run: bool,
        tasks: Vec<TaskReview>,
        duration_ms: u64,
    ) -> Self {
        let summary = summarize(&tasks);
        let question_stats = compute_question_stats(key, &tasks);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            answer_key: AnswerKeySummary::from(key),
            approval_threshold,
            dry_run,
            tasks,
            summary,
            question_stats,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ReviewReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
