//! Batch summaries and per-question statistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::AnswerKey;
use crate::report::{TaskOutcome, TaskReview};
use crate::results::{FailureReason, Verdict};

/// Counts over one review batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Tasks whose tracker actions failed.
    pub errored: usize,
    /// Mean score over all graded tasks.
    pub mean_score: f64,
}

/// How one question fared across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question: String,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    /// Share of tasks that earned no point on this question.
    pub miss_rate: f64,
}

/// Summarize verdicts and outcomes.
pub fn summarize(reviews: &[TaskReview]) -> ReviewSummary {
    let total = reviews.len();
    let approved = reviews
        .iter()
        .filter(|r| r.verdict == Verdict::Approved)
        .count();
    let errored = reviews
        .iter()
        .filter(|r| matches!(r.outcome, TaskOutcome::Errored { .. }))
        .count();
    let mean_score = if total > 0 {
        reviews.iter().map(|r| r.result.score).sum::<f64>() / total as f64
    } else {
        0.0
    };

    ReviewSummary {
        total,
        approved,
        rejected: total - approved,
        errored,
        mean_score,
    }
}

/// Per-question statistics, in answer-key order.
pub fn compute_question_stats(key: &AnswerKey, reviews: &[TaskReview]) -> Vec<QuestionStats> {
    let mut misses: HashMap<&str, (usize, usize)> = HashMap::new();
    for review in reviews {
        for failure in &review.result.failures {
            let entry = misses.entry(failure.question.as_str()).or_default();
            match failure.reason {
                FailureReason::Incorrect => entry.0 += 1,
                FailureReason::Unanswered => entry.1 += 1,
            }
        }
    }

    let total = reviews.len();
    key.questions()
        .iter()
        .map(|q| {
            let (incorrect, unanswered) = misses.get(q.id.as_str()).copied().unwrap_or_default();
            let missed = incorrect + unanswered;
            QuestionStats {
                question: q.id.clone(),
                correct: total.saturating_sub(missed),
                incorrect,
                unanswered,
                miss_rate: if total > 0 {
                    missed as f64 / total as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}
