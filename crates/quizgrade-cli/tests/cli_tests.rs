//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizgrade(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizgrade").unwrap();
    cmd.env("HOME", home)
        .env_remove("QUIZGRADE_ASANA_TOKEN")
        .env_remove("QUIZGRADE_PROJECT")
        .env_remove("RUST_LOG");
    cmd
}

const SMALL_KEY: &str = r#"
[answer_key]
id = "small"
name = "Small Quiz"

[[questions]]
id = "El maní y el huevo son alérgenos alimentarios."
type = "exact"
expected = "Verdadero"

[[questions]]
id = "No es necesario lavarse las manos antes de ingresar a la planta."
type = "exact"
expected = "Falso"

[[questions]]
id = "Seleccione los elementos obligatorios"
type = "multi"
expected = ["Cofia", "Mascarilla"]

[[questions]]
id = "Mencione tres riesgos a los que estará expuesto en la empresa."
type = "concepts"
minimum = 3
groups = [["cortes", "corte"], ["quemaduras", "quemadura"], ["ruido"], ["incendios", "fuego"]]
"#;

const TASKS: &str = r#"[
  {
    "gid": "101",
    "name": "Quiz - Ana",
    "assignee": "Ana",
    "fields": [
      {"name": "El maní y el huevo son alérgenos alimentarios.", "subtype": "single_choice", "selected": "Verdadero"},
      {"name": "No es necesario lavarse las manos antes de ingresar a la planta.", "subtype": "single_choice", "selected": "Falso"},
      {"name": "Seleccione los elementos obligatorios", "subtype": "multi_choice", "selected": ["Cofia", "Mascarilla", "Guantes"]},
      {"name": "Mencione tres riesgos a los que estará expuesto en la empresa.", "subtype": "text", "value": "Cortes, quemadras y mucho ruido"}
    ]
  },
  {
    "gid": "102",
    "name": "Quiz - Luis",
    "assignee": "Luis",
    "fields": [
      {"name": "El maní y el huevo son alérgenos alimentarios.", "subtype": "single_choice", "selected": "Falso"},
      {"name": "Mencione tres riesgos a los que estará expuesto en la empresa.", "subtype": "text", "value": "ruido"}
    ]
  }
]"#;

fn write_fixture(dir: &Path) {
    std::fs::write(dir.join("key.toml"), SMALL_KEY).unwrap();
    std::fs::write(dir.join("tasks.json"), TASKS).unwrap();
}

fn single_report(dir: &Path, extension: &str) -> String {
    let path = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == extension))
        .unwrap_or_else(|| panic!("no .{extension} report in {}", dir.display()));
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn validate_sample_answer_key() {
    let home = TempDir::new().unwrap();
    quizgrade(home.path())
        .arg("validate")
        .arg("--answer-key")
        .arg("../../answer-keys/induction.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("16 questions"))
        .stdout(predicate::str::contains("All answer keys valid"));
}

#[test]
fn validate_directory() {
    let home = TempDir::new().unwrap();
    quizgrade(home.path())
        .arg("validate")
        .arg("--answer-key")
        .arg("../../answer-keys")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Inducción Ingreso Personal Nuevo/Contratista",
        ));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[answer_key]
id = "bad"
name = "Bad"

[[questions]]
id = "q1"
type = "concepts"
minimum = 3
groups = [["a"], ["b"]]
"#,
    )
    .unwrap();

    quizgrade(dir.path())
        .arg("validate")
        .arg("--answer-key")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING"))
        .stdout(predicate::str::contains("can never pass"));
}

#[test]
fn validate_rejects_unknown_question_type() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[answer_key]\nid = \"x\"\nname = \"X\"\n\n[[questions]]\nid = \"q1\"\ntype = \"essay\"\n",
    )
    .unwrap();

    quizgrade(dir.path())
        .arg("validate")
        .arg("--answer-key")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_nonexistent_file() {
    let home = TempDir::new().unwrap();
    quizgrade(home.path())
        .arg("validate")
        .arg("--answer-key")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizgrade(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizgrade.toml"))
        .stdout(predicate::str::contains("Created answer-keys/induction.toml"));

    assert!(dir.path().join("quizgrade.toml").exists());
    assert!(dir.path().join("answer-keys/induction.toml").exists());

    // The generated key validates
    quizgrade(dir.path())
        .current_dir(dir.path())
        .arg("validate")
        .arg("--answer-key")
        .arg("answer-keys/induction.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All answer keys valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    quizgrade(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // Second init should skip
    quizgrade(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn grade_offline_input() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let out = dir.path().join("out");

    quizgrade(dir.path())
        .current_dir(dir.path())
        .args(["grade", "--answer-key", "key.toml", "--input", "tasks.json"])
        .arg("--output")
        .arg(&out)
        .args(["--format", "all"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Quiz - Ana"))
        .stderr(predicate::str::contains("1/2 approved"));

    let json: serde_json::Value = serde_json::from_str(&single_report(&out, "json")).unwrap();
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["approval_threshold"], 0.75);
    assert_eq!(json["summary"]["approved"], 1);
    assert_eq!(json["summary"]["rejected"], 1);
    assert_eq!(json["tasks"][0]["verdict"], "approved");
    assert_eq!(json["tasks"][0]["outcome"]["status"], "skipped");
    assert!(json["tasks"][1]["comment"]
        .as_str()
        .unwrap()
        .starts_with("🤖 Rejected (0% | 0/4 pts)."));

    assert!(single_report(&out, "html").contains("Quiz - Luis"));
    assert!(single_report(&out, "md").contains("| Quiz - Ana | Ana | 100% (4/4) | approved | skipped |"));
}

#[test]
fn grade_threshold_flag_overrides_key() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let out = dir.path().join("out");

    quizgrade(dir.path())
        .current_dir(dir.path())
        .args(["grade", "--answer-key", "key.toml", "--input", "tasks.json"])
        .args(["--threshold", "0.0"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("2/2 approved"));

    let json: serde_json::Value = serde_json::from_str(&single_report(&out, "json")).unwrap();
    assert_eq!(json["approval_threshold"], 0.0);
}

#[test]
fn grade_assignee_filter() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let out = dir.path().join("out");

    quizgrade(dir.path())
        .current_dir(dir.path())
        .args(["grade", "--answer-key", "key.toml", "--input", "tasks.json"])
        .args(["--assignee", "luis"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("0/1 approved"));
}

#[test]
fn grade_rejects_out_of_range_threshold() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    quizgrade(dir.path())
        .current_dir(dir.path())
        .args(["grade", "--answer-key", "key.toml", "--input", "tasks.json"])
        .args(["--threshold", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("threshold must be between"));
}

#[test]
fn grade_without_tracker_config_fails() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    quizgrade(dir.path())
        .current_dir(dir.path())
        .args(["grade", "--answer-key", "key.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tracker configured"));
}

#[test]
fn grade_with_unset_project_variable_asks_for_project() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    std::fs::write(
        dir.path().join("quizgrade.toml"),
        "project_gid = \"${QUIZGRADE_PROJECT}\"\n\n[tracker]\ntype = \"asana\"\ntoken = \"pat-test\"\n",
    )
    .unwrap();

    quizgrade(dir.path())
        .current_dir(dir.path())
        .args(["grade", "--answer-key", "key.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no project given"));
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    quizgrade(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("grade"))
        .stdout(predicate::str::contains("sections"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    quizgrade(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizgrade"));
}
