//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use quizgrade_core::report::{ReviewReport, TaskOutcome};
use quizgrade_core::results::Verdict;
use quizgrade_core::statistics::QuestionStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn outcome_label(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Completed => "completed".to_string(),
        TaskOutcome::Commented => "commented".to_string(),
        TaskOutcome::Skipped => "skipped".to_string(),
        TaskOutcome::Errored { message } => format!("error: {message}"),
    }
}

/// Generate an HTML report from a review report.
pub fn generate_html(report: &ReviewReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>quizgrade report: {}</title>\n",
        html_escape(&report.answer_key.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>quizgrade report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Answer key: <strong>{}</strong> | {} questions | threshold {:.0}% | {}{}</p>\n",
        html_escape(&report.answer_key.name),
        report.answer_key.question_count,
        report.approval_threshold * 100.0,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if report.dry_run { " | dry run" } else { "" }
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    let summary = &report.summary;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Tasks</th><th>Approved</th><th>Rejected</th><th>Errors</th><th>Mean score</th><th>Duration</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}ms</td></tr></tbody>\n",
        summary.total,
        summary.approved,
        summary.rejected,
        summary.errored,
        summary.mean_score * 100.0,
        report.duration_ms,
    ));
    html.push_str("</table>\n");

    if !report.question_stats.is_empty() && summary.total > 0 {
        html.push_str("<h3>Most missed questions</h3>\n");
        html.push_str(&generate_bar_chart(&report.question_stats));
    }

    html.push_str("</section>\n");

    // Per-task results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Tasks</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Task</th><th onclick=\"sortTable(1)\">Assignee</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Verdict</th><th onclick=\"sortTable(4)\">Tracker</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for t in &report.tasks {
        let class = match t.verdict {
            Verdict::Approved => "pass",
            Verdict::Rejected => "fail",
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}% ({}/{})</td><td>{}</td><td>{}</td></tr>\n",
            class,
            html_escape(&t.name),
            html_escape(t.assignee.as_deref().unwrap_or("Unassigned")),
            t.result.percent(),
            t.result.points_earned,
            t.result.points_total,
            t.verdict,
            html_escape(&outcome_label(&t.outcome)),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Feedback as posted to each task
    html.push_str("<section class=\"feedback\">\n");
    html.push_str("<h2>Feedback</h2>\n");
    for t in &report.tasks {
        html.push_str(&format!(
            "<details>\n<summary>{}</summary>\n<pre>{}</pre>\n</details>\n",
            html_escape(&t.name),
            html_escape(&t.comment)
        ));
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ReviewReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal bars of per-question miss rate, worst first.
fn generate_bar_chart(stats: &[QuestionStats]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 320;
    let max_label_chars = 48;

    let mut rows: Vec<&QuestionStats> = stats.iter().filter(|s| s.miss_rate > 0.0).collect();
    rows.sort_by(|a, b| b.miss_rate.total_cmp(&a.miss_rate));
    rows.truncate(10);

    if rows.is_empty() {
        return "<p>Every question was answered correctly.</p>\n".to_string();
    }

    let total_height = rows.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, stat) in rows.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (stat.miss_rate * max_width as f64) as usize;

        let color = if stat.miss_rate >= 0.5 {
            "#ef4444"
        } else if stat.miss_rate >= 0.2 {
            "#eab308"
        } else {
            "#22c55e"
        };

        let label: String = if stat.question.chars().count() > max_label_chars {
            let short: String = stat.question.chars().take(max_label_chars - 1).collect();
            format!("{short}…")
        } else {
            stat.question.clone()
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.0}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            stat.miss_rate * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; white-space: pre-wrap; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
