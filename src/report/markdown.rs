use crate::analysis::Analysis;
use crate::types::Assignment;

pub fn render_markdown(assignments: &[Assignment], analysis: &Analysis, generated_at: &str) -> String {
    let mut report = String::new();

    report.push_str("# ManageBac Assignment Report\n\n");
    report.push_str(&format!("Generated: {}\n\n", generated_at));

    report.push_str("## Overview\n\n");
    report.push_str(&format!("- Total assignments: {}\n", analysis.total_assignments));
    report.push_str(&format!("- Urgent: {}\n", analysis.urgent_count));
    report.push_str(&format!(
        "- Pending: {} | Submitted: {} | Overdue: {}\n",
        analysis.pending_count, analysis.submitted_count, analysis.overdue_count
    ));
    report.push_str(&format!(
        "- Priority: high {} | medium {} | low {}\n",
        analysis.by_priority.high, analysis.by_priority.medium, analysis.by_priority.low
    ));
    if !analysis.by_course.is_empty() {
        let mut courses: Vec<_> = analysis.by_course.iter().collect();
        courses.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let listed: Vec<String> = courses
            .iter()
            .map(|(course, count)| format!("{} ({})", course, count))
            .collect();
        report.push_str(&format!("- Courses: {}\n", listed.join(", ")));
    }
    report.push('\n');

    report.push_str("## Pending\n\n");
    if analysis.grouped_by_status.pending.is_empty() {
        report.push_str("- None\n");
    } else {
        for item in &analysis.grouped_by_status.pending {
            report.push_str(&format!(
                "- {} - due: {} (course: {})\n",
                item.title, item.due_date, item.course
            ));
        }
    }
    report.push('\n');

    report.push_str("## Overdue\n\n");
    if analysis.grouped_by_status.overdue.is_empty() {
        report.push_str("- None\n");
    } else {
        for item in &analysis.grouped_by_status.overdue {
            report.push_str(&format!("- {} - due: {}\n", item.title, item.due_date));
        }
    }
    report.push('\n');

    report.push_str("## All Assignments\n\n");
    if assignments.is_empty() {
        report.push_str("*No assignments found*\n\n");
    }
    for (idx, item) in assignments.iter().enumerate() {
        report.push_str(&format!("### {}. {}\n", idx + 1, item.title));
        report.push_str(&format!("- Course: {}\n", item.course));
        report.push_str(&format!("- Due: {}\n", item.due_date));
        report.push_str(&format!("- Status: {}\n", item.status));
        report.push_str(&format!("- Priority: {}\n", item.priority));
        if let Some(link) = &item.link {
            report.push_str(&format!("- Link: [{}]({})\n", link, link));
        }
        report.push('\n');
    }

    report.push_str("---\n");
    report.push_str("Generated by ManageBac Assignment Checker\n");
    report
}
