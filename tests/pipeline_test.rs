//! End-to-end tests of the post-scrape pipeline: analysis, rendering,
//! persistence and the notification gate.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use managebac_checker::config::{Config, ConfigLayer};
use managebac_checker::report::ReportFormat;
use managebac_checker::runner::Runner;
use managebac_checker::types::{Assignment, ScrapeStatus};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap()
}

fn temp_output(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("managebac_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn config(formats: &[&str], output_dir: &PathBuf, extra: ConfigLayer) -> Config {
    let base = ConfigLayer {
        email: Some("student@example.com".to_string()),
        password: Some("secret".to_string()),
        report_formats: Some(formats.iter().map(|f| f.to_string()).collect()),
        output_dir: Some(output_dir.clone()),
        ..ConfigLayer::default()
    };
    Config::from_layers(None, base, extra).expect("valid config")
}

fn sample() -> Vec<Assignment> {
    vec![Assignment::new("Math worksheet", "Mathematics", "Pending", "today", now())]
}

#[tokio::test]
async fn test_console_and_json_only_json_persisted() {
    let dir = temp_output("console_json");
    let runner = Runner::new(config(&["console", "json"], &dir, ConfigLayer::default()));

    let report = runner
        .process(sample(), ScrapeStatus::Completed, now())
        .await
        .unwrap();

    let built: Vec<_> = report.reports.keys().copied().collect();
    assert_eq!(built, vec![ReportFormat::Json, ReportFormat::Console]);
    let saved: Vec<_> = report.saved_files.keys().copied().collect();
    assert_eq!(saved, vec![ReportFormat::Json]);

    let path = &report.saved_files[&ReportFormat::Json];
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "managebac_report_20250305_103000.json"
    );

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["analysis"]["total_assignments"], 1);
    assert_eq!(value["assignments"].as_array().unwrap().len(), 1);
    assert_eq!(value["assignments"][0]["id"], "math worksheet::today");
    assert_eq!(value["analysis"]["assignments_by_urgency"]["urgent"][0]["title"], "Math worksheet");

    assert!(report.reports[&ReportFormat::Console].contains("Math worksheet"));
    assert_eq!(report.scrape_status, ScrapeStatus::Completed);

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_markdown_and_html_use_their_extensions() {
    let dir = temp_output("md_html");
    let runner = Runner::new(config(&["markdown", "html", "pdf"], &dir, ConfigLayer::default()));

    let report = runner
        .process(sample(), ScrapeStatus::Completed, now())
        .await
        .unwrap();

    assert_eq!(report.reports.len(), 2);
    let md = &report.saved_files[&ReportFormat::Markdown];
    let html = &report.saved_files[&ReportFormat::Html];
    assert_eq!(md.extension().unwrap(), "md");
    assert_eq!(html.extension().unwrap(), "html");
    assert!(fs::read_to_string(html).unwrap().starts_with("<!DOCTYPE html>"));

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_login_failure_still_produces_reports() {
    let dir = temp_output("login_failed");
    let runner = Runner::new(config(&["json"], &dir, ConfigLayer::default()));

    let report = runner
        .process(Vec::new(), ScrapeStatus::LoginFailed, now())
        .await
        .unwrap();

    assert_eq!(report.scrape_status, ScrapeStatus::LoginFailed);
    assert_eq!(report.analysis.total_assignments, 0);
    assert!(report.analysis.grouped_by_status.is_empty());
    assert!(report.saved_files[&ReportFormat::Json].exists());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_no_urgent_items_skips_email() {
    let dir = temp_output("no_urgent");
    let smtp = ConfigLayer {
        enable_notifications: Some(true),
        smtp_server: Some("smtp.invalid".to_string()),
        email_user: Some("checker@example.com".to_string()),
        email_password: Some("pw".to_string()),
        notification_email: Some("parent@example.com".to_string()),
        ..ConfigLayer::default()
    };
    let runner = Runner::new(config(&["console"], &dir, smtp));
    assert!(runner.config().notification().is_some());

    let later = vec![Assignment::new("Portfolio", "Visual Arts", "Pending", "2025-06-01", now())];
    let report = runner
        .process(later, ScrapeStatus::Completed, now())
        .await
        .unwrap();

    assert!(report.analysis.assignments_by_urgency.urgent.is_empty());
    assert!(report.saved_files.is_empty());
    assert!(!dir.exists(), "console-only runs write nothing");
}
