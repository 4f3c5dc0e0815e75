use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Due-date text used when a record carries no recognizable deadline.
pub const NO_DUE_DATE: &str = "No due date";

/// Course name used when neither a sub-selector nor a subject keyword matched.
pub const UNKNOWN_COURSE: &str = "unknown";

/// One task/homework item extracted from the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "id")]
    pub identifier: String,
    pub title: String,
    pub course: String,
    pub status: String,
    pub due_date: String,
    #[serde(rename = "type")]
    pub assignment_type: AssignmentType,
    pub priority: Priority,
    pub submitted: bool,
    pub overdue: bool,
    pub link: Option<String>,
    pub description: Option<String>,
    pub raw_text: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Assignment {
    /// Builds a record with the identifier derived from title and due date.
    pub fn new(
        title: impl Into<String>,
        course: impl Into<String>,
        status: impl Into<String>,
        due_date: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        let due_date = due_date.into();
        Self {
            identifier: make_identifier(&title, &due_date),
            title,
            course: course.into(),
            status: status.into(),
            due_date,
            assignment_type: AssignmentType::Unknown,
            priority: Priority::Low,
            submitted: false,
            overdue: false,
            link: None,
            description: None,
            raw_text: None,
            fetched_at,
        }
    }
}

/// `lowercase(title) :: lowercase(due_date)`
pub fn make_identifier(title: &str, due_date: &str) -> String {
    format!(
        "{}::{}",
        title.trim().to_lowercase(),
        due_date.trim().to_lowercase()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssignmentType {
    Summative,
    Formative,
    Essay,
    Unknown,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Summative => "Summative",
            AssignmentType::Formative => "Formative",
            AssignmentType::Essay => "Essay",
            AssignmentType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission state inferred from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Submitted,
    Overdue,
    Pending,
    Unknown,
}

impl StatusKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Submitted => "Submitted",
            StatusKind::Overdue => "Overdue",
            StatusKind::Pending => "Pending",
            StatusKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status bucket used by the analysis record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBucket {
    Submitted,
    Pending,
    Overdue,
    Unknown,
}

/// Due-date urgency relative to the analysis "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Soon,
    Later,
}

/// Whether the scrape got past the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    Completed,
    LoginFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_is_lowercased() {
        assert_eq!(make_identifier(" Essay Draft ", "Friday"), "essay draft::friday");
    }

    #[test]
    fn test_assignment_serializes_with_report_keys() {
        let fetched = DateTime::parse_from_rfc3339("2025-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut assignment = Assignment::new("Lab Report", "Chemistry", "Pending", "2025-03-04", fetched);
        assignment.assignment_type = AssignmentType::Formative;
        assignment.priority = Priority::Medium;

        let value = serde_json::to_value(&assignment).unwrap();
        assert_eq!(value["id"], "lab report::2025-03-04");
        assert_eq!(value["type"], "Formative");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["fetched_at"], "2025-03-01T08:00:00Z");
        assert!(value["link"].is_null());
    }
}
