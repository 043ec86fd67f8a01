//! TOML answer key parser.
//!
//! Loads answer keys from TOML files and directories, and validates them.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerKey, AnswerKeyHeader, AnswerSpec, Question};

/// Intermediate TOML structure for parsing answer key files.
#[derive(Debug, Deserialize)]
struct TomlAnswerKeyFile {
    answer_key: AnswerKeyHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

/// Parse a single TOML file into an `AnswerKey`.
pub fn load_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer key file: {}", path.display()))?;

    parse_answer_key_str(&content, path)
}

/// Parse a TOML string into an `AnswerKey` (useful for testing).
pub fn parse_answer_key_str(content: &str, source_path: &Path) -> Result<AnswerKey> {
    let parsed: TomlAnswerKeyFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    AnswerKey::new(parsed.answer_key, parsed.questions)
        .with_context(|| format!("invalid answer key: {}", source_path.display()))
}

/// Recursively load all `.toml` answer key files from a directory.
pub fn load_answer_key_directory(dir: &Path) -> Result<Vec<AnswerKey>> {
    let mut keys = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            keys.extend(load_answer_key_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match load_answer_key(&path) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(keys)
}

/// Load a file, or every answer key under a directory.
pub fn load_answer_keys(path: &Path) -> Result<Vec<AnswerKey>> {
    if path.is_dir() {
        load_answer_key_directory(path)
    } else {
        Ok(vec![load_answer_key(path)?])
    }
}

/// A warning from answer key validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check an answer key for issues that do not prevent grading but are
/// almost certainly mistakes.
pub fn validate_answer_key(key: &AnswerKey) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if key.is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "answer key has no questions; every submission scores 0".into(),
        });
    }

    for question in key.questions() {
        let AnswerSpec::OpenConcept { minimum, groups } = &question.answer else {
            continue;
        };

        if *minimum == 0 {
            warnings.push(ValidationWarning {
                question: Some(question.id.clone()),
                message: "minimum is 0; any non-empty answer passes".into(),
            });
        }

        if *minimum as usize > groups.len() {
            warnings.push(ValidationWarning {
                question: Some(question.id.clone()),
                message: format!(
                    "minimum {} exceeds the {} concept groups; this question can never pass",
                    minimum,
                    groups.len()
                ),
            });
        }

        // The same synonym in two groups makes one word count twice.
        let mut owner: HashMap<String, usize> = HashMap::new();
        for (index, group) in groups.iter().enumerate() {
            for synonym in group {
                let normalized = synonym.trim().to_lowercase();
                match owner.get(&normalized) {
                    Some(&first) if first != index => {
                        warnings.push(ValidationWarning {
                            question: Some(question.id.clone()),
                            message: format!(
                                "synonym '{}' appears in groups #{} and #{}",
                                synonym,
                                first + 1,
                                index + 1
                            ),
                        });
                    }
                    Some(_) => {}
                    None => {
                        owner.insert(normalized, index);
                    }
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[answer_key]
id = "induction"
name = "Induction"
description = "Safety induction quiz"
approval_threshold = 0.7

[[questions]]
id = "El maní y el huevo son alérgenos alimentarios."
type = "exact"
expected = "Verdadero"

[[questions]]
id = "Seleccione los EPP obligatorios"
type = "multi"
expected = ["Cofia", "Zapatos de seguridad"]

[[questions]]
id = "Mencione tres riesgos a los que estará expuesto en la empresa."
type = "concepts"
minimum = 3
groups = [
    ["cortes", "corte"],
    ["caídas", "caidas", "caída", "caida"],
    ["ruido"],
]

[[questions]]
id = "¿Qué significa HACCP?"
type = "substring"
expected = "análisis de peligros"
"#;

    #[test]
    fn parse_valid_toml() {
        let key = parse_answer_key_str(VALID_TOML, &PathBuf::from("key.toml")).unwrap();
        assert_eq!(key.id(), "induction");
        assert_eq!(key.approval_threshold(), 0.7);
        assert_eq!(key.len(), 4);

        let kinds: Vec<&str> = key.questions().iter().map(|q| q.answer.kind()).collect();
        assert_eq!(kinds, vec!["exact", "multi", "concepts", "substring"]);

        match &key.questions()[2].answer {
            AnswerSpec::OpenConcept { minimum, groups } => {
                assert_eq!(*minimum, 3);
                assert_eq!(groups[1].len(), 4);
            }
            other => panic!("unexpected answer: {other:?}"),
        }
    }

    #[test]
    fn parse_defaults() {
        let toml = r#"
[answer_key]
id = "minimal"
name = "Minimal"

[[questions]]
id = "q1"
type = "exact"
expected = "A"
"#;
        let key = parse_answer_key_str(toml, &PathBuf::from("key.toml")).unwrap();
        assert_eq!(key.approval_threshold(), 0.75);
        assert_eq!(key.header().description, "");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let toml = r#"
[answer_key]
id = "bad"
name = "Bad"

[[questions]]
id = "q1"
type = "regex"
expected = "A.*"
"#;
        let err = parse_answer_key_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse TOML"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let toml = r#"
[answer_key]
id = "dupes"
name = "Dupes"

[[questions]]
id = "same"
type = "exact"
expected = "A"

[[questions]]
id = "same"
type = "exact"
expected = "B"
"#;
        let err = parse_answer_key_str(toml, &PathBuf::from("dupes.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate question id: same"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_answer_key_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_unreachable_minimum_and_shared_synonyms() {
        let toml = r#"
[answer_key]
id = "warn"
name = "Warn"

[[questions]]
id = "q1"
type = "concepts"
minimum = 3
groups = [["ruido", "sonido"], ["Ruido"]]
"#;
        let key = parse_answer_key_str(toml, &PathBuf::from("warn.toml")).unwrap();
        let warnings = validate_answer_key(&key);
        assert!(warnings.iter().any(|w| w.message.contains("can never pass")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("appears in groups #1 and #2")));
    }

    #[test]
    fn validate_clean_key() {
        let key = parse_answer_key_str(VALID_TOML, &PathBuf::from("key.toml")).unwrap();
        assert!(validate_answer_key(&key).is_empty());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not = [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let keys = load_answer_key_directory(dir.path()).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id(), "induction");
    }
}
