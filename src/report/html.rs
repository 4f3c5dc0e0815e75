use crate::analysis::Analysis;
use crate::types::Assignment;

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Arial, sans-serif; margin: 24px; background: #f9fafb; color: #111827; }
.container { max-width: 980px; margin: 0 auto; background: white; padding: 24px; border-radius: 12px; box-shadow: 0 10px 30px rgba(15, 23, 42, 0.1); }
h1 { margin-top: 0; }
table { width: 100%; border-collapse: collapse; margin: 16px 0; }
th, td { padding: 10px 14px; text-align: left; border-bottom: 1px solid #e5e7eb; }
th { background: #2563eb; color: white; }
.badge { display: inline-block; padding: 4px 10px; border-radius: 999px; background: #eff6ff; color: #1d4ed8; margin-right: 8px; }
.badge.urgent { background: #fee2e2; color: #b91c1c; }
section { margin-top: 28px; }
footer { margin-top: 32px; color: #6b7280; }
"#;

/// Self-contained page: inline CSS, no scripts or external assets.
pub fn render_html(assignments: &[Assignment], analysis: &Analysis, generated_at: &str) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n");
    html.push_str("<title>ManageBac Assignment Report</title>\n");
    html.push_str(&format!("<style>{}</style>\n", STYLE));
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");
    html.push_str("<h1>ManageBac Assignment Report</h1>\n");
    html.push_str(&format!("<p>Generated: {}</p>\n", escape_html(generated_at)));

    html.push_str("<section>\n<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<span class=\"badge\">Total: {}</span>\n",
        analysis.total_assignments
    ));
    html.push_str(&format!(
        "<span class=\"badge urgent\">Urgent: {}</span>\n",
        analysis.urgent_count
    ));
    html.push_str(&format!(
        "<span class=\"badge\">Pending: {}</span>\n",
        analysis.pending_count
    ));
    html.push_str(&format!(
        "<span class=\"badge\">Overdue: {}</span>\n",
        analysis.overdue_count
    ));
    html.push_str(&format!(
        "<span class=\"badge\">Submitted: {}</span>\n",
        analysis.submitted_count
    ));
    html.push_str("</section>\n");

    push_table(&mut html, "Pending", &analysis.grouped_by_status.pending);
    push_table(&mut html, "Overdue", &analysis.grouped_by_status.overdue);
    push_table(&mut html, "All Assignments", assignments);

    html.push_str("<footer><small>Generated by ManageBac Assignment Checker.</small></footer>\n");
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn push_table(html: &mut String, heading: &str, items: &[Assignment]) {
    html.push_str(&format!("<section>\n<h2>{}</h2>\n<table>\n", heading));
    html.push_str(
        "<thead><tr><th>Assignment</th><th>Course</th><th>Due</th><th>Status</th><th>Priority</th></tr></thead>\n<tbody>\n",
    );

    if items.is_empty() {
        html.push_str("<tr><td colspan=\"5\">None</td></tr>\n");
    }
    for item in items {
        let title = match &item.link {
            Some(link) => format!(
                "<a href=\"{}\">{}</a>",
                escape_html(link),
                escape_html(&item.title)
            ),
            None => escape_html(&item.title),
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            title,
            escape_html(&item.course),
            escape_html(&item.due_date),
            escape_html(&item.status),
            item.priority
        ));
    }

    html.push_str("</tbody>\n</table>\n</section>\n");
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyse_assignments;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_html_is_self_contained_and_escaped() {
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap();
        let items = vec![Assignment::new("<b>Q&A</b> worksheet", "Mathematics", "Pending", "Monday", now)];
        let analysis = analyse_assignments(&items, &["exam"], 7, now);

        let html = render_html(&items, &analysis, "2025-03-05T10:30:00Z");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("&lt;b&gt;Q&amp;A&lt;/b&gt; worksheet"));
        assert!(!html.contains("<b>Q&A</b>"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("<script"));
        assert!(html.contains("Mathematics"));
    }
}
