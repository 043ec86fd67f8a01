//! Core data model types for quizgrade.
//!
//! These are the fundamental types the rest of the system uses to represent
//! answer keys, submitted fields, and tracker records.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// How a single question is graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnswerSpec {
    /// The answer must equal a single option label.
    #[serde(rename = "exact")]
    ExactChoice { expected: String },

    /// Every expected option must be selected. Extra selections are not
    /// penalized.
    #[serde(rename = "multi")]
    MultiChoice { expected: BTreeSet<String> },

    /// Free text that must mention at least `minimum` concept groups.
    #[serde(rename = "concepts")]
    OpenConcept {
        minimum: u32,
        groups: Vec<Vec<String>>,
    },

    /// Free text that must contain `expected`, ignoring case.
    #[serde(rename = "substring")]
    SubstringMatch { expected: String },
}

impl AnswerSpec {
    /// Human-readable rendering of what the question requires.
    pub fn describe(&self) -> String {
        match self {
            AnswerSpec::ExactChoice { expected } => expected.clone(),
            AnswerSpec::MultiChoice { expected } => join_labels(expected),
            AnswerSpec::OpenConcept { minimum, groups } => {
                let examples: Vec<&str> = groups
                    .iter()
                    .take(CONCEPT_EXAMPLES)
                    .filter_map(|g| g.first().map(String::as_str))
                    .collect();
                format!(
                    "mention {minimum} concepts, e.g. {}...",
                    examples.join(", ")
                )
            }
            AnswerSpec::SubstringMatch { expected } => format!("contain \"{expected}\""),
        }
    }

    /// Short name of the variant, as written in answer key files.
    pub fn kind(&self) -> &'static str {
        match self {
            AnswerSpec::ExactChoice { .. } => "exact",
            AnswerSpec::MultiChoice { .. } => "multi",
            AnswerSpec::OpenConcept { .. } => "concepts",
            AnswerSpec::SubstringMatch { .. } => "substring",
        }
    }
}

/// Number of concept group representatives shown in a requirement line.
const CONCEPT_EXAMPLES: usize = 4;

/// One question of an answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier; matches the submitted field name.
    pub id: String,
    /// How the question is graded.
    #[serde(flatten)]
    pub answer: AnswerSpec,
}

impl Question {
    pub fn new(id: impl Into<String>, answer: AnswerSpec) -> Self {
        Self {
            id: id.into(),
            answer,
        }
    }
}

/// Descriptive metadata of an answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyHeader {
    /// Unique identifier for this answer key.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the quiz.
    #[serde(default)]
    pub description: String,
    /// Minimum score for a submission to be approved.
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: f64,
}

impl Default for AnswerKeyHeader {
    fn default() -> Self {
        Self {
            id: "answer-key".into(),
            name: "Answer key".into(),
            description: String::new(),
            approval_threshold: default_approval_threshold(),
        }
    }
}

/// Default approval threshold.
pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 0.75;

fn default_approval_threshold() -> f64 {
    DEFAULT_APPROVAL_THRESHOLD
}

/// A validated answer key.
///
/// Questions keep their declared order, which drives the order of failure
/// and success details. Construction rejects structural defects, so a key
/// that exists is always gradable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerKey {
    header: AnswerKeyHeader,
    questions: Vec<Question>,
}

impl AnswerKey {
    /// Build an answer key, rejecting structural defects.
    pub fn new(header: AnswerKeyHeader, questions: Vec<Question>) -> Result<Self, KeyError> {
        if !(0.0..=1.0).contains(&header.approval_threshold) {
            return Err(KeyError::InvalidThreshold(header.approval_threshold));
        }

        let mut seen = HashSet::new();
        for (index, question) in questions.iter().enumerate() {
            if question.id.trim().is_empty() {
                return Err(KeyError::EmptyQuestionId(index + 1));
            }
            if !seen.insert(question.id.as_str()) {
                return Err(KeyError::DuplicateQuestion(question.id.clone()));
            }
            check_answer(&question.id, &question.answer)?;
        }

        Ok(Self { header, questions })
    }

    /// Build an answer key with default metadata.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, KeyError> {
        Self::new(AnswerKeyHeader::default(), questions)
    }

    pub fn header(&self) -> &AnswerKeyHeader {
        &self.header
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn approval_threshold(&self) -> f64 {
        self.header.approval_threshold
    }

    /// Questions in declared order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn check_answer(question: &str, answer: &AnswerSpec) -> Result<(), KeyError> {
    match answer {
        AnswerSpec::ExactChoice { expected } | AnswerSpec::SubstringMatch { expected } => {
            if expected.trim().is_empty() {
                return Err(KeyError::EmptyExpected(question.to_string()));
            }
        }
        AnswerSpec::MultiChoice { expected } => {
            if expected.is_empty() {
                return Err(KeyError::EmptyChoiceSet(question.to_string()));
            }
        }
        AnswerSpec::OpenConcept { groups, .. } => {
            if groups.is_empty() {
                return Err(KeyError::NoConceptGroups(question.to_string()));
            }
            for (index, group) in groups.iter().enumerate() {
                if group.is_empty() {
                    return Err(KeyError::EmptyConceptGroup {
                        question: question.to_string(),
                        group: index + 1,
                    });
                }
                if group.iter().any(|s| s.trim().is_empty()) {
                    return Err(KeyError::BlankSynonym {
                        question: question.to_string(),
                        group: index + 1,
                    });
                }
            }
        }
    }
    Ok(())
}

/// A custom field as delivered by the tracker, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    /// Field name; used as the question identifier.
    pub name: String,
    /// Subtype-specific payload.
    #[serde(flatten)]
    pub payload: FieldPayload,
}

impl RawField {
    pub fn single_choice(name: impl Into<String>, selected: Option<&str>) -> Self {
        Self {
            name: name.into(),
            payload: FieldPayload::SingleChoice {
                selected: selected.map(str::to_string),
            },
        }
    }

    pub fn multi_choice(name: impl Into<String>, selected: &[&str]) -> Self {
        Self {
            name: name.into(),
            payload: FieldPayload::MultiChoice {
                selected: selected.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn text(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            payload: FieldPayload::Text {
                value: value.map(str::to_string),
            },
        }
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: FieldPayload::Other,
        }
    }
}

/// Payload of a raw field, keyed by its subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum FieldPayload {
    SingleChoice {
        #[serde(default)]
        selected: Option<String>,
    },
    MultiChoice {
        #[serde(default)]
        selected: Vec<String>,
    },
    Text {
        #[serde(default)]
        value: Option<String>,
    },
    /// Any subtype that carries no gradable value (numbers, dates, people...).
    #[serde(other)]
    Other,
}

/// A submitted answer after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    #[default]
    Missing,
    Text(String),
    Choice(String),
    MultiChoice(BTreeSet<String>),
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Text form of the value, used by free-text answer checks.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Text(s) | FieldValue::Choice(s) => s.clone(),
            FieldValue::MultiChoice(set) => join_labels(set),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => write!(f, "no answer"),
            FieldValue::Text(s) | FieldValue::Choice(s) => write!(f, "{s}"),
            FieldValue::MultiChoice(set) => write!(f, "{}", join_labels(set)),
        }
    }
}

fn join_labels<'a>(labels: impl IntoIterator<Item = &'a String>) -> String {
    labels
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A section (column) of a tracker project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub gid: String,
    pub name: String,
}

/// A quiz submission as fetched from the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Tracker identifier of the task.
    pub gid: String,
    /// Task title.
    #[serde(default = "default_task_name")]
    pub name: String,
    /// Display name of the assignee, if any.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Custom fields holding the answers.
    #[serde(default)]
    pub fields: Vec<RawField>,
}

fn default_task_name() -> String {
    "Untitled".to_string()
}

impl TaskRecord {
    /// Assignee name, or a placeholder for unassigned tasks.
    pub fn assignee_name(&self) -> &str {
        self.assignee.as_deref().unwrap_or("Unassigned")
    }
}
