//! The `quizgrade init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create quizgrade.toml
    if Path::new("quizgrade.toml").exists() {
        println!("quizgrade.toml already exists, skipping.");
    } else {
        std::fs::write("quizgrade.toml", SAMPLE_CONFIG)?;
        println!("Created quizgrade.toml");
    }

    // Create the induction answer key
    std::fs::create_dir_all("answer-keys")?;
    let key_path = Path::new("answer-keys/induction.toml");
    if key_path.exists() {
        println!("answer-keys/induction.toml already exists, skipping.");
    } else {
        std::fs::write(key_path, INDUCTION_KEY)?;
        println!("Created answer-keys/induction.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export QUIZGRADE_ASANA_TOKEN and set project_gid in quizgrade.toml");
    println!("  2. Run: quizgrade validate --answer-key answer-keys/induction.toml");
    println!("  3. Run: quizgrade grade --answer-key answer-keys/induction.toml --dry-run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizgrade configuration

project_gid = "${QUIZGRADE_PROJECT}"
default_section = "Inducción Ingreso Personal Nuevo/Contratista"
comment_on_pass = true
max_retries = 3
retry_delay_ms = 1000
output_dir = "./quizgrade-results"

# Overrides the answer key's approval_threshold when uncommented.
# approval_threshold = 0.75

[tracker]
type = "asana"
token = "${QUIZGRADE_ASANA_TOKEN}"
"#;

const INDUCTION_KEY: &str = include_str!("../../../../answer-keys/induction.toml");
