//! Line-oriented fallback for pages without a recognizable assignment list.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::{classify_priority, classify_type, contains_keyword};
use crate::types::{Assignment, NO_DUE_DATE, UNKNOWN_COURSE};

use super::extract::{push_unique, ExtractContext};

const MIN_LINE_CHARS: usize = 10;
const MAX_SCAN_LINES: usize = 20;
const MAX_TITLE_CHARS: usize = 100;

const DUE_KEYWORDS: &[&str] = &["due", "deadline", "submit", "截止", "提交", "到期"];

const CHINESE_SUBJECTS: &[&str] = &[
    "数学", "语文", "英语", "物理", "化学", "生物", "历史", "地理", "政治", "经济", "计算机", "心理",
];

const ENGLISH_SUBJECTS: &[&str] = &[
    "Mathematics",
    "Math",
    "English",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Geography",
    "Economics",
    "Psychology",
    "Computer Science",
    "Chinese",
];

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b",
        r"\b\d{1,2}/\d{1,2}/\d{4}\b",
        r"\d{4}年\d{1,2}月\d{1,2}日",
        r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:,\s*\d{4})?\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static COURSE_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:AP|IB)(?:\s+[A-Z][A-Za-z]*)+(?:\s+(?:HL|SL))?|[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*\s+(?:HL|SL))\b",
    )
    .unwrap()
});

/// Builds pending assignments from deadline-looking lines of visible text.
pub fn scan_text(body_text: &str, ctx: &ExtractContext<'_>) -> Vec<Assignment> {
    let lines: Vec<&str> = body_text
        .lines()
        .map(str::trim)
        .filter(|line| is_deadline_line(line))
        .take(MAX_SCAN_LINES)
        .collect();

    tracing::debug!(lines = lines.len(), "Deadline lines found by text scan");

    let mut seen = HashSet::new();
    let mut assignments = Vec::new();
    for line in lines {
        let title: String = line.chars().take(MAX_TITLE_CHARS).collect();
        let due = find_date_token(line).unwrap_or_else(|| NO_DUE_DATE.to_string());

        let mut assignment = Assignment::new(title, find_course(line), "Pending", due, ctx.fetched_at);
        assignment.assignment_type = classify_type(line);
        assignment.priority = classify_priority(line, ctx.priority_keywords);
        assignment.raw_text = Some(line.to_string());
        push_unique(&mut assignments, &mut seen, assignment);
    }
    assignments
}

fn is_deadline_line(line: &str) -> bool {
    if line.chars().count() < MIN_LINE_CHARS {
        return false;
    }
    let lowered = line.to_lowercase();
    DUE_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// First hit of the date patterns, tried in order.
pub fn find_date_token(line: &str) -> Option<String> {
    DATE_PATTERNS
        .iter()
        .find_map(|re| re.find(line))
        .map(|m| m.as_str().to_string())
}

/// AP/IB/HL/SL course phrase, else a known subject name, else `"unknown"`.
pub fn find_course(line: &str) -> String {
    if let Some(m) = COURSE_PHRASE_RE.find(line) {
        return m.as_str().trim().to_string();
    }

    if let Some(subject) = CHINESE_SUBJECTS.iter().find(|s| line.contains(*s)) {
        return subject.to_string();
    }

    let lowered = line.to_lowercase();
    ENGLISH_SUBJECTS
        .iter()
        .find(|s| contains_keyword(&lowered, &s.to_lowercase()))
        .map(|s| s.to_string())
        .unwrap_or_else(|| UNKNOWN_COURSE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;
    use chrono::{TimeZone, Utc};

    fn scan(text: &str) -> Vec<Assignment> {
        let keywords = vec!["exam".to_string()];
        let ctx = ExtractContext {
            priority_keywords: &keywords,
            fetched_at: Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap(),
        };
        scan_text(text, &ctx)
    }

    #[test]
    fn test_date_patterns_in_order() {
        assert_eq!(find_date_token("Essay due 2025-03-10 or 12/03/2025").as_deref(), Some("2025-03-10"));
        assert_eq!(find_date_token("Due 12/03/2025").as_deref(), Some("12/03/2025"));
        assert_eq!(find_date_token("作业截止 2025年3月9日").as_deref(), Some("2025年3月9日"));
        assert_eq!(find_date_token("Deadline March 14, 2025").as_deref(), Some("March 14, 2025"));
        assert_eq!(find_date_token("Deadline Sept 3").as_deref(), Some("Sept 3"));
        assert_eq!(find_date_token("Due whenever"), None);
    }

    #[test]
    fn test_course_lookup() {
        assert_eq!(find_course("AP Calculus BC problem set due Friday"), "AP Calculus BC");
        assert_eq!(find_course("Physics HL lab due 2025-03-10"), "Physics HL");
        assert_eq!(find_course("数学作业 截止 明天"), "数学");
        assert_eq!(find_course("submit the economics reflection"), "Economics");
        assert_eq!(find_course("submit the reflection please"), UNKNOWN_COURSE);
    }

    #[test]
    fn test_scan_keeps_deadline_lines_only() {
        let text = "Welcome back\nDue soon\nLab report due 2025-03-10\nExam review sheet, deadline March 14\nNothing to see here at all";
        let items = scan(text);
        let titles: Vec<_> = items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Lab report due 2025-03-10", "Exam review sheet, deadline March 14"]);
        assert!(items.iter().all(|a| a.status == "Pending"));
        assert_eq!(items[0].due_date, "2025-03-10");
        assert_eq!(items[1].due_date, "March 14");
        assert_eq!(items[1].priority, Priority::High);
    }

    #[test]
    fn test_deadline_words_match_inside_longer_words() {
        let items = scan("Overdue lab write-up for Chemistry
Resubmitted poster for Geography");
        let titles: Vec<_> = items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Overdue lab write-up for Chemistry", "Resubmitted poster for Geography"]);
        assert_eq!(items[0].course, "Chemistry");
        assert_eq!(items[0].due_date, NO_DUE_DATE);
    }

    #[test]
    fn test_scan_caps_lines_and_dedups() {
        let mut text = String::from("Repeat task due 2025-01-01\nRepeat task due 2025-01-01\n");
        for i in 0..30 {
            text.push_str(&format!("Worksheet {} due 2025-02-{:02}\n", i, i % 28 + 1));
        }
        let items = scan(&text);
        assert_eq!(items.len(), 19);
        assert_eq!(items[0].title, "Repeat task due 2025-01-01");
    }

    #[test]
    fn test_no_deadline_words_is_empty() {
        assert!(scan("Home\nCalendar\nMessages from your teachers").is_empty());
    }
}
