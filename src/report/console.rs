use crate::analysis::Analysis;
use crate::types::Assignment;

use super::truncate_str;

/// Items listed per section before the rest is summarized.
const CONSOLE_LIST_LIMIT: usize = 10;

/// Compact totals plus the first pending and overdue items.
pub fn render_console(analysis: &Analysis, generated_at: &str) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("ManageBac assignment report - {}\n", generated_at));
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!(
        "Total: {} | Urgent: {} | Overdue: {} | Pending: {} | Submitted: {}\n",
        analysis.total_assignments,
        analysis.urgent_count,
        analysis.overdue_count,
        analysis.pending_count,
        analysis.submitted_count,
    ));

    out.push_str("\nPending:\n");
    push_items(&mut out, &analysis.grouped_by_status.pending, true);

    out.push_str("\nOverdue:\n");
    push_items(&mut out, &analysis.grouped_by_status.overdue, false);

    out
}

fn push_items(out: &mut String, items: &[Assignment], with_course: bool) {
    if items.is_empty() {
        out.push_str(" - none\n");
        return;
    }

    for item in items.iter().take(CONSOLE_LIST_LIMIT) {
        let title = truncate_str(&item.title, 80);
        if with_course {
            out.push_str(&format!(
                " - {} (due: {}, course: {})\n",
                title, item.due_date, item.course
            ));
        } else {
            out.push_str(&format!(" - {} (due: {})\n", title, item.due_date));
        }
    }

    if items.len() > CONSOLE_LIST_LIMIT {
        out.push_str(&format!(" ... and {} more\n", items.len() - CONSOLE_LIST_LIMIT));
    }
}
