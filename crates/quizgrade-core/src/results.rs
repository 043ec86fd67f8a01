//! Grading result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of grading one submission against an answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    /// `points_earned / points_total`, or 0 for an empty key.
    pub score: f64,
    pub points_earned: u32,
    pub points_total: u32,
    /// Unanswered and incorrect questions, in answer-key order.
    pub failures: Vec<FailureDetail>,
    /// Passed open-concept questions, in answer-key order.
    pub successes: Vec<SuccessDetail>,
}

impl GradingResult {
    /// Whether the score reaches the approval threshold.
    pub fn passes(&self, threshold: f64) -> bool {
        self.score >= threshold
    }

    /// Score as a whole percentage, halves rounded to even.
    pub fn percent(&self) -> u32 {
        (self.score * 100.0).round_ties_even() as u32
    }

    /// Number of questions left unanswered.
    pub fn unanswered(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.reason == FailureReason::Unanswered)
            .count()
    }
}

/// Pass/fail decision for a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub fn decide(result: &GradingResult, threshold: f64) -> Self {
        if result.passes(threshold) {
            Verdict::Approved
        } else {
            Verdict::Rejected
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approved => write!(f, "approved"),
            Verdict::Rejected => write!(f, "rejected"),
        }
    }
}

/// Why a question earned no points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Unanswered,
    Incorrect,
}

/// Concepts detected in an open-text answer against the required minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptTally {
    /// Labels of the detected concept groups.
    pub detected: Vec<String>,
    /// Minimum number of concepts required.
    pub required: u32,
}

impl ConceptTally {
    pub fn count(&self) -> usize {
        self.detected.len()
    }
}

impl fmt::Display for ConceptTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.detected.len(), self.required)
    }
}

/// A question that earned no points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub question: String,
    pub reason: FailureReason,
    /// What was submitted, formatted for display.
    pub submitted: String,
    /// What the key requires, formatted for display.
    pub expected: String,
    /// Concept detection, for open-concept questions.
    #[serde(default)]
    pub tally: Option<ConceptTally>,
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            FailureReason::Unanswered => {
                write!(f, "⚠️ Question '{}': not answered.", self.question)
            }
            FailureReason::Incorrect => {
                writeln!(f, "❌ Question: {}", self.question)?;
                if let Some(tally) = &self.tally {
                    writeln!(f, "   • Status: Incorrect (Detected: {tally})")?;
                }
                writeln!(f, "   • Your answer: {}", self.submitted)?;
                write!(f, "   • Requirement: {}", self.expected)
            }
        }
    }
}

/// A passed open-concept question, kept for positive feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessDetail {
    pub question: String,
    pub tally: ConceptTally,
    pub submitted: String,
}

impl fmt::Display for SuccessDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✅ Question: {} (Detected: {})", self.question, self.tally)?;
        write!(f, "   • Your answer: {}", self.submitted)
    }
}
