//! Keyword Classification Module
//!
//! Small pure classifiers used by both the scraper and the analyzer:
//! - submission status (submitted / overdue / pending / unknown)
//! - assignment type (summative / formative / essay)
//! - priority (configured keywords, then generic task words)
//!
//! Keyword tables are plain data so ordering is explicit: the first row whose
//! keywords hit wins.

use crate::types::{AssignmentType, Priority, StatusKind};

/// A row of a keyword table: the value returned and the keywords that select it.
pub type KeywordRow<T> = (T, &'static [&'static str]);

/// Phrases that mention submission only to negate it. They are removed from the
/// text before the status table runs and imply Pending on their own.
pub const NEGATED_SUBMISSION: &[&str] = &[
    "not submitted",
    "unsubmitted",
    "not turned in",
    "未提交",
    "未上交",
    "待提交",
];

pub const STATUS_TABLE: &[KeywordRow<StatusKind>] = &[
    (StatusKind::Submitted, &["submitted", "turned in", "handed in", "已提交", "已上交"]),
    (StatusKind::Overdue, &["overdue", "late", "逾期", "迟交", "迟"]),
    (StatusKind::Pending, &["pending", "to do", "todo", "待"]),
];

pub const TYPE_TABLE: &[KeywordRow<AssignmentType>] = &[
    (AssignmentType::Summative, &["summative", "总结性"]),
    (AssignmentType::Formative, &["formative", "形成性"]),
    (AssignmentType::Essay, &["essay", "论文", "作文"]),
];

/// Words that make a task at least medium priority when no configured keyword hit.
pub const MEDIUM_PRIORITY_WORDS: &[&str] = &["quiz", "assignment", "homework", "测验", "作业"];

/// Returns the value of the first row with a keyword found in `text`.
/// Matching is case-insensitive; see [`contains_keyword`].
pub fn classify<T: Copy>(text: &str, table: &[KeywordRow<T>]) -> Option<T> {
    let lowered = text.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&lowered, k)))
        .map(|(value, _)| *value)
}

/// Substring match that, for ASCII keywords, requires the match to start a word
/// ("late" hits "late submission" but not "calculate"). Suffixes are allowed so
/// plurals still match.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    if !keyword.is_ascii() {
        return haystack.contains(keyword);
    }
    haystack.match_indices(keyword).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Infers the submission state from free text.
pub fn classify_status(text: &str) -> StatusKind {
    let mut lowered = text.to_lowercase();
    let mut negated = false;
    for phrase in NEGATED_SUBMISSION {
        if lowered.contains(phrase) {
            negated = true;
            lowered = lowered.replace(phrase, " ");
        }
    }

    match classify(&lowered, STATUS_TABLE) {
        Some(kind) => kind,
        None if negated => StatusKind::Pending,
        None => StatusKind::Unknown,
    }
}

pub fn classify_type(text: &str) -> AssignmentType {
    classify(text, TYPE_TABLE).unwrap_or(AssignmentType::Unknown)
}

/// Configured keywords (already lowercased) win, then generic task words.
pub fn classify_priority(text: &str, keywords: &[String]) -> Priority {
    let lowered = text.to_lowercase();
    if keywords.iter().any(|k| contains_keyword(&lowered, k)) {
        return Priority::High;
    }
    if MEDIUM_PRIORITY_WORDS.iter().any(|w| contains_keyword(&lowered, w)) {
        return Priority::Medium;
    }
    Priority::Low
}

/// Trims, lowercases, sorts and de-duplicates a keyword list.
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<String> {
        normalize_keywords(&["Exam", "test", " project ", "essay", ""])
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(classify_status("Submitted late"), StatusKind::Submitted);
        assert_eq!(classify_status("Turned in"), StatusKind::Submitted);
        assert_eq!(classify_status("OVERDUE"), StatusKind::Overdue);
        assert_eq!(classify_status("Pending review"), StatusKind::Pending);
        assert_eq!(classify_status("Graded"), StatusKind::Unknown);
    }

    #[test]
    fn test_keyword_must_start_a_word() {
        assert_eq!(classify_status("Calculate the integral"), StatusKind::Unknown);
        assert!(contains_keyword("two assignments left", "assignment"));
        assert!(!contains_keyword("contest entry", "test"));
        assert!(contains_keyword("数学作业", "作业"));
    }

    #[test]
    fn test_negated_submission_is_pending() {
        assert_eq!(classify_status("Not submitted"), StatusKind::Pending);
        assert_eq!(classify_status("未提交"), StatusKind::Pending);
        assert_eq!(classify_status("not submitted - overdue"), StatusKind::Overdue);
    }

    #[test]
    fn test_type_keywords() {
        assert_eq!(classify_type("Unit 3 Summative Test"), AssignmentType::Summative);
        assert_eq!(classify_type("formative check-in"), AssignmentType::Formative);
        assert_eq!(classify_type("Persuasive Essay"), AssignmentType::Essay);
        assert_eq!(classify_type("Reading log"), AssignmentType::Unknown);
    }

    #[test]
    fn test_priority_levels() {
        let kw = keywords();
        assert_eq!(classify_priority("Final Exam", &kw), Priority::High);
        assert_eq!(classify_priority("Math Homework", &kw), Priority::Medium);
        assert_eq!(classify_priority("Reading Assignment", &kw), Priority::Medium);
        assert_eq!(classify_priority("Reading log", &kw), Priority::Low);
        assert_eq!(classify_priority("Final Exam", &[]), Priority::Low);
    }

    #[test]
    fn test_normalize_keywords() {
        assert_eq!(keywords(), vec!["essay", "exam", "project", "test"]);
    }
}
