//! Report Building Module
//!
//! Renders assignments + analysis into the requested formats and writes every
//! non-console rendering to `<output_dir>/managebac_report_<UTC stamp>.<ext>`.

mod console;
mod html;
mod markdown;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::analysis::Analysis;
use crate::storage;
use crate::types::Assignment;

pub(crate) use html::escape_html;
pub use console::render_console;
pub use html::render_html;
pub use markdown::render_markdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
    Html,
    Console,
}

impl ReportFormat {
    /// Case-insensitive; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "markdown" | "md" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            "console" => Some(Self::Console),
            _ => None,
        }
    }

    /// Known formats in request order, duplicates dropped, unknown names skipped.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        let mut formats = Vec::new();
        for name in names {
            match Self::parse(name.as_ref()) {
                Some(format) if !formats.contains(&format) => formats.push(format),
                Some(_) => {}
                None => tracing::debug!(format = name.as_ref(), "Skipping unknown report format"),
            }
        }
        formats
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Console => "console",
        }
    }

    /// File extension, or `None` for formats that are never written to disk.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Json => Some("json"),
            Self::Markdown => Some("md"),
            Self::Html => Some("html"),
            Self::Console => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format → rendered content.
pub type Reports = BTreeMap<ReportFormat, String>;

/// Format → written file.
pub type SavedFiles = BTreeMap<ReportFormat, PathBuf>;

#[derive(Serialize)]
struct ReportPayload<'a> {
    assignments: &'a [Assignment],
    analysis: &'a Analysis,
    generated_at: String,
}

pub struct ReportBuilder {
    output_dir: PathBuf,
    formats: Vec<ReportFormat>,
    generated_at: DateTime<Utc>,
}

impl ReportBuilder {
    /// `generated_at` stamps both the report bodies and the file names.
    pub fn new(output_dir: impl Into<PathBuf>, formats: Vec<ReportFormat>, generated_at: DateTime<Utc>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats,
            generated_at,
        }
    }

    pub fn generated_at_label(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn build(&self, assignments: &[Assignment], analysis: &Analysis) -> Reports {
        let generated_at = self.generated_at_label();
        let mut reports = Reports::new();

        for format in &self.formats {
            let rendered = match format {
                ReportFormat::Json => match render_json(assignments, analysis, &generated_at) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::error!(error = %err, "Failed to serialize JSON report");
                        continue;
                    }
                },
                ReportFormat::Markdown => render_markdown(assignments, analysis, &generated_at),
                ReportFormat::Html => render_html(assignments, analysis, &generated_at),
                ReportFormat::Console => render_console(analysis, &generated_at),
            };
            reports.insert(*format, rendered);
        }

        reports
    }

    /// Writes every non-console report; console output never touches disk.
    pub fn persist(&self, reports: &Reports) -> Result<SavedFiles> {
        let mut saved = SavedFiles::new();
        for (format, content) in reports {
            let Some(extension) = format.extension() else {
                continue;
            };
            let path = storage::save_report(&self.output_dir, self.generated_at, extension, content)?;
            tracing::info!(format = %format, path = %path.display(), "Saved report");
            saved.insert(*format, path);
        }
        Ok(saved)
    }
}

pub fn render_json(assignments: &[Assignment], analysis: &Analysis, generated_at: &str) -> Result<String> {
    let payload = ReportPayload {
        assignments,
        analysis,
        generated_at: generated_at.to_string(),
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Helper to truncate strings for display (Unicode-safe)
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyse_assignments;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_parse_list_skips_unknown_and_duplicates() {
        let formats = ReportFormat::parse_list(&["Console", "pdf", "md", "json", "console"]);
        assert_eq!(
            formats,
            vec![ReportFormat::Console, ReportFormat::Markdown, ReportFormat::Json]
        );
    }

    #[test]
    fn test_build_only_requested_formats() {
        let items = vec![Assignment::new("Lab", "Physics", "Pending", "today", now())];
        let analysis = analyse_assignments(&items, &["exam"], 7, now());
        let builder = ReportBuilder::new("unused", vec![ReportFormat::Html], now());

        let reports = builder.build(&items, &analysis);
        assert_eq!(reports.keys().copied().collect::<Vec<_>>(), vec![ReportFormat::Html]);
    }

    #[test]
    fn test_json_keeps_non_ascii_and_counts() {
        let items = vec![Assignment::new("数学作业", "数学", "未提交", "明天", now())];
        let analysis = analyse_assignments(&items, &["exam"], 7, now());
        let json = render_json(&items, &analysis, "2025-03-05T10:30:00Z").unwrap();
        assert!(json.contains("数学作业"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["analysis"]["total_assignments"], 1);
        assert_eq!(value["analysis"]["grouped_by_status"]["pending"][0]["title"], "数学作业");
        assert_eq!(value["analysis"]["assignments_by_urgency"]["urgent"].as_array().unwrap().len(), 1);
        assert_eq!(value["generated_at"], "2025-03-05T10:30:00Z");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("一二三四五六", 5), "一二...");
    }
}
