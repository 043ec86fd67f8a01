//! The `quizgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::parser::{load_answer_keys, validate_answer_key};

pub fn execute(answer_key_path: PathBuf) -> Result<()> {
    let keys = load_answer_keys(&answer_key_path)?;
    anyhow::ensure!(
        !keys.is_empty(),
        "no answer keys found in {}",
        answer_key_path.display()
    );

    let mut total_warnings = 0;

    for key in &keys {
        println!(
            "Answer key: {} ({} questions, threshold {:.0}%)",
            key.name(),
            key.len(),
            key.approval_threshold() * 100.0
        );

        let warnings = validate_answer_key(key);
        for w in &warnings {
            let prefix = w
                .question
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All answer keys valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
