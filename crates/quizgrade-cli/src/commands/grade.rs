//! The `quizgrade grade` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use quizgrade_core::engine::{ProgressReporter, ReviewConfig, ReviewEngine};
use quizgrade_core::grader::Grader;
use quizgrade_core::model::{Section, TaskRecord};
use quizgrade_core::parser;
use quizgrade_core::report::{ReviewReport, TaskOutcome, TaskReview};
use quizgrade_core::traits::TaskTracker;
use quizgrade_report::html::write_html_report;
use quizgrade_report::markdown::write_markdown_report;
use quizgrade_tracker::config::load_config_from;
use quizgrade_tracker::create_tracker;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_task_start(&self, task: &TaskRecord) {
        eprintln!("  Grading: {} ({})", task.name, task.assignee_name());
    }

    fn on_task_graded(&self, review: &TaskReview) {
        let action = match &review.outcome {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Commented => "commented",
            TaskOutcome::Skipped => "no action",
            TaskOutcome::Errored { .. } => "tracker error",
        };
        eprintln!(
            "  Done: {} {}% ({}/{}) {} [{}]",
            review.name,
            review.result.percent(),
            review.result.points_earned,
            review.result.points_total,
            review.verdict,
            action,
        );
    }

    fn on_task_error(&self, task: &TaskRecord, error: &str) {
        eprintln!("  ERROR: {}: {error}", task.name);
    }

    fn on_batch_complete(&self, total: usize, approved: usize, errored: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {approved}/{total} approved, {errored} tracker errors ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    answer_key_path: PathBuf,
    project: Option<String>,
    section_name: Option<String>,
    input: Option<PathBuf>,
    assignee: Option<String>,
    threshold: Option<f64>,
    dry_run: bool,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if let Some(t) = threshold {
        anyhow::ensure!(
            (0.0..=1.0).contains(&t),
            "threshold must be between 0.0 and 1.0"
        );
    }
    let formats = parse_formats(&format)?;

    let config = load_config_from(config_path.as_deref())?;
    let key = parser::load_answer_key(&answer_key_path)?;
    let approval_threshold =
        resolve_threshold(threshold, config.approval_threshold, key.approval_threshold());

    // Fetch tasks, either offline or from the tracker
    let (mut tasks, tracker): (Vec<TaskRecord>, Option<Arc<dyn TaskTracker>>) = match &input {
        Some(path) => (load_tasks(path)?, None),
        None => {
            let tracker_config = config.tracker.as_ref().context(
                "no tracker configured; add a [tracker] table to quizgrade.toml or use --input",
            )?;
            let tracker: Arc<dyn TaskTracker> = Arc::from(create_tracker(tracker_config)?);
            let project = project
                .or_else(|| config.project_gid.clone())
                .context("no project given; pass --project or set project_gid in quizgrade.toml")?;

            let sections = tracker
                .list_sections(&project)
                .await
                .with_context(|| format!("failed to list sections of project {project}"))?;
            let section =
                resolve_section(&sections, section_name.as_deref(), &config.default_section)?;

            let tasks = tracker
                .list_open_tasks(&section.gid)
                .await
                .with_context(|| format!("failed to list tasks of section '{}'", section.name))?;
            eprintln!(
                "Section '{}' ({}): {} open task(s)",
                section.name,
                tracker.name(),
                tasks.len()
            );
            (tasks, Some(tracker))
        }
    };

    if let Some(filter) = &assignee {
        let names: Vec<String> = filter
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        tasks.retain(|t| names.contains(&t.assignee_name().to_lowercase()));
    }

    if tasks.is_empty() {
        println!("No open tasks to grade.");
        return Ok(());
    }

    let dry_run = dry_run || tracker.is_none();
    eprintln!(
        "quizgrade v{}: grading {} task(s) against '{}' ({} questions, threshold {:.0}%){}",
        env!("CARGO_PKG_VERSION"),
        tasks.len(),
        key.name(),
        key.len(),
        approval_threshold * 100.0,
        if dry_run { ", dry run" } else { "" }
    );
    eprintln!();

    let review_config = ReviewConfig {
        approval_threshold,
        dry_run,
        comment_on_pass: config.comment_on_pass,
        max_retries: config.max_retries,
        retry_delay: Duration::from_millis(config.retry_delay_ms),
    };
    let mut engine = ReviewEngine::new(Grader::new(key), review_config);
    if let Some(tracker) = tracker {
        engine = engine.with_tracker(tracker);
    }

    let report = engine.review(&tasks, &ConsoleReporter).await;

    print_summary(&report);

    // Save outputs
    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for fmt in formats {
        let path = output.join(format!("review-{timestamp}.{}", fmt.extension()));
        match fmt {
            OutputFormat::Json => {
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            OutputFormat::Html => {
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            OutputFormat::Markdown => {
                write_markdown_report(&report, &path)?;
                eprintln!("Markdown report: {}", path.display());
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Html,
    Markdown,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
        }
    }
}

fn parse_formats(format: &str) -> Result<Vec<OutputFormat>> {
    if format == "all" {
        return Ok(vec![
            OutputFormat::Json,
            OutputFormat::Html,
            OutputFormat::Markdown,
        ]);
    }
    format
        .split(',')
        .map(|f| match f.trim() {
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => anyhow::bail!("unknown format '{other}' (expected json, html, markdown, all)"),
        })
        .collect()
}

/// CLI flag, then config (only when set), then the answer key's own threshold.
fn resolve_threshold(cli: Option<f64>, config: Option<f64>, key: f64) -> f64 {
    cli.or(config).unwrap_or(key)
}

fn find_section<'a>(sections: &'a [Section], name: &str) -> Option<&'a Section> {
    let wanted = name.trim();
    sections.iter().find(|s| s.name == wanted).or_else(|| {
        sections
            .iter()
            .find(|s| s.name.trim().to_lowercase() == wanted.to_lowercase())
    })
}

/// Pick the section to grade.
///
/// An explicit `--section` must match. Only the configured default may fall
/// back to the first section of the project.
fn resolve_section<'a>(
    sections: &'a [Section],
    explicit: Option<&str>,
    default: &str,
) -> Result<&'a Section> {
    if let Some(name) = explicit {
        return find_section(sections, name).with_context(|| {
            let available: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
            format!(
                "section '{}' not found (available: {})",
                name.trim(),
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            )
        });
    }
    if let Some(section) = find_section(sections, default) {
        return Ok(section);
    }
    let first = sections.first().context("project has no sections")?;
    tracing::warn!(
        "default section '{}' not found, falling back to '{}'",
        default.trim(),
        first.name
    );
    Ok(first)
}

fn load_tasks(path: &Path) -> Result<Vec<TaskRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tasks from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse tasks JSON: {}", path.display()))
}

fn print_summary(report: &ReviewReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Task", "Assignee", "Score", "Verdict", "Tracker"]);

    for t in &report.tasks {
        let tracker = match &t.outcome {
            TaskOutcome::Completed => "completed".to_string(),
            TaskOutcome::Commented => "commented".to_string(),
            TaskOutcome::Skipped => "-".to_string(),
            TaskOutcome::Errored { message } => format!("error: {message}"),
        };
        table.add_row(vec![
            Cell::new(&t.name),
            Cell::new(t.assignee.as_deref().unwrap_or("Unassigned")),
            Cell::new(format!(
                "{}% ({}/{})",
                t.result.percent(),
                t.result.points_earned,
                t.result.points_total
            )),
            Cell::new(t.verdict),
            Cell::new(tracker),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Approved {} / Rejected {} / Mean score {:.1}%",
        report.summary.approved,
        report.summary.rejected,
        report.summary.mean_score * 100.0
    );
}
