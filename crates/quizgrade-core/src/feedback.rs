//! Comment text posted back to graded tasks.

use crate::results::{GradingResult, Verdict};

/// Compose the comment for a graded submission.
pub fn compose_comment(result: &GradingResult, verdict: Verdict) -> String {
    let points = format!("{}/{} pts", result.points_earned, result.points_total);
    let failures = join_lines(&result.failures);

    match verdict {
        Verdict::Approved => {
            let mut msg = format!("✅ Task approved ({}% | {points}).", result.percent());
            let mut details = String::new();
            if !result.failures.is_empty() {
                details.push_str(&format!("\n\n⚠️ Minor observations:\n{failures}"));
            }
            if !result.successes.is_empty() {
                details.push_str(&format!(
                    "\n\n📝 Open answer details:\n{}",
                    join_lines(&result.successes)
                ));
            }
            if details.is_empty() {
                msg.push_str(" Excellent work, no errors!");
            } else {
                msg.push_str(&details);
            }
            msg
        }
        Verdict::Rejected => format!(
            "🤖 Rejected ({}% | {points}).\nCorrections required:\n\n{failures}",
            result.percent()
        ),
    }
}

fn join_lines<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
