//! Markdown report generator, for pasting into chats or issue trackers.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use quizgrade_core::report::{ReviewReport, TaskOutcome};

/// Escape characters that would break a table cell.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Generate a Markdown summary of a review report.
pub fn generate_markdown(report: &ReviewReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    let _ = writeln!(md, "# quizgrade report: {}\n", report.answer_key.name);
    let _ = writeln!(
        md,
        "{} tasks graded against {} questions, threshold {:.0}%{}.\n",
        summary.total,
        report.answer_key.question_count,
        report.approval_threshold * 100.0,
        if report.dry_run { " (dry run)" } else { "" }
    );

    md.push_str("| Approved | Rejected | Errors | Mean score |\n");
    md.push_str("|---:|---:|---:|---:|\n");
    let _ = writeln!(
        md,
        "| {} | {} | {} | {:.1}% |\n",
        summary.approved,
        summary.rejected,
        summary.errored,
        summary.mean_score * 100.0
    );

    if !report.tasks.is_empty() {
        md.push_str("## Tasks\n\n");
        md.push_str("| Task | Assignee | Score | Verdict | Tracker |\n");
        md.push_str("|---|---|---:|---|---|\n");
        for t in &report.tasks {
            let tracker = match &t.outcome {
                TaskOutcome::Completed => "completed".to_string(),
                TaskOutcome::Commented => "commented".to_string(),
                TaskOutcome::Skipped => "skipped".to_string(),
                TaskOutcome::Errored { message } => format!("error: {message}"),
            };
            let _ = writeln!(
                md,
                "| {} | {} | {}% ({}/{}) | {} | {} |",
                cell(&t.name),
                cell(t.assignee.as_deref().unwrap_or("Unassigned")),
                t.result.percent(),
                t.result.points_earned,
                t.result.points_total,
                t.verdict,
                cell(&tracker),
            );
        }
        md.push('\n');
    }

    let mut missed: Vec<_> = report
        .question_stats
        .iter()
        .filter(|s| s.miss_rate > 0.0)
        .collect();
    if !missed.is_empty() {
        missed.sort_by(|a, b| b.miss_rate.total_cmp(&a.miss_rate));
        md.push_str("## Most missed questions\n\n");
        md.push_str("| Question | Incorrect | Unanswered | Miss rate |\n");
        md.push_str("|---|---:|---:|---:|\n");
        for s in missed {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {:.0}% |",
                cell(&s.question),
                s.incorrect,
                s.unanswered,
                s.miss_rate * 100.0
            );
        }
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &ReviewReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))?;
    Ok(())
}
