//! The grading engine.
//!
//! Scores normalized answers against a validated answer key. Grading never
//! fails: missing or malformed answers are classified as unanswered or
//! incorrect.

use crate::matcher::detect_concepts;
use crate::model::{AnswerKey, AnswerSpec, FieldValue, RawField};
use crate::normalize::{normalize_fields, NormalizedFields};
use crate::results::{ConceptTally, FailureDetail, FailureReason, GradingResult, SuccessDetail};

/// Grades submissions against one answer key.
#[derive(Debug, Clone)]
pub struct Grader {
    key: AnswerKey,
}

/// Verdict on a single answer.
struct Assessment {
    correct: bool,
    tally: Option<ConceptTally>,
}

impl Grader {
    pub fn new(key: AnswerKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    /// Normalize raw tracker fields and grade them.
    pub fn grade_fields(&self, fields: &[RawField]) -> GradingResult {
        self.grade(&normalize_fields(fields))
    }

    /// Grade normalized answers. Questions are visited in key order.
    pub fn grade(&self, answers: &NormalizedFields) -> GradingResult {
        let mut points_earned = 0u32;
        let mut failures = Vec::new();
        let mut successes = Vec::new();

        for question in self.key.questions() {
            let submitted = answers.get(&question.id).unwrap_or(&FieldValue::Missing);

            if submitted.is_missing() {
                failures.push(FailureDetail {
                    question: question.id.clone(),
                    reason: FailureReason::Unanswered,
                    submitted: submitted.to_string(),
                    expected: question.answer.describe(),
                    tally: None,
                });
                continue;
            }

            let assessment = assess(&question.answer, submitted);
            tracing::debug!(
                question = %question.id,
                kind = question.answer.kind(),
                correct = assessment.correct,
                "graded answer"
            );

            if assessment.correct {
                points_earned += 1;
                if let Some(tally) = assessment.tally {
                    successes.push(SuccessDetail {
                        question: question.id.clone(),
                        tally,
                        submitted: submitted.to_string(),
                    });
                }
            } else {
                failures.push(FailureDetail {
                    question: question.id.clone(),
                    reason: FailureReason::Incorrect,
                    submitted: submitted.to_string(),
                    expected: question.answer.describe(),
                    tally: assessment.tally,
                });
            }
        }

        let points_total = self.key.len() as u32;
        let score = if points_total > 0 {
            points_earned as f64 / points_total as f64
        } else {
            0.0
        };

        GradingResult {
            score,
            points_earned,
            points_total,
            failures,
            successes,
        }
    }
}

fn assess(answer: &AnswerSpec, submitted: &FieldValue) -> Assessment {
    match answer {
        AnswerSpec::ExactChoice { expected } => {
            let correct = match submitted {
                FieldValue::Choice(label) => label.trim() == expected.as_str(),
                FieldValue::MultiChoice(labels) if labels.len() == 1 => {
                    labels.iter().all(|label| label == expected)
                }
                _ => false,
            };
            Assessment {
                correct,
                tally: None,
            }
        }
        AnswerSpec::MultiChoice { expected } => {
            // Extra selections beyond the expected set are not penalized.
            let correct = match submitted {
                FieldValue::MultiChoice(selected) => {
                    expected.intersection(selected).count() == expected.len()
                }
                _ => false,
            };
            Assessment {
                correct,
                tally: None,
            }
        }
        AnswerSpec::OpenConcept { minimum, groups } => {
            let detected = detect_concepts(&submitted.to_text(), groups);
            let correct = detected.len() >= *minimum as usize;
            Assessment {
                correct,
                tally: Some(ConceptTally {
                    detected,
                    required: *minimum,
                }),
            }
        }
        AnswerSpec::SubstringMatch { expected } => {
            let text = submitted.to_text().to_lowercase();
            Assessment {
                correct: text.contains(&expected.to_lowercase()),
                tally: None,
            }
        }
    }
}
