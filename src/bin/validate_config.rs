//! Configuration Validation Binary
//!
//! Loads the checker configuration exactly as a run would and reports:
//! - load failures (missing credentials, malformed values or YAML)
//! - settings that will break a run
//! - settings that will silently degrade one

use std::path::PathBuf;
use std::process::ExitCode;

use managebac_checker::config::{lint, Config, ConfigLayer};

fn main() -> ExitCode {
    let path = std::env::args().nth(1).map(PathBuf::from);

    println!("=== ManageBac Checker Configuration Validator ===");

    let config = match Config::load(path.as_deref(), ConfigLayer::default()) {
        Ok(config) => config,
        Err(e) => {
            println!("\n❌ Failed to load configuration: {}", e);
            return ExitCode::from(1);
        }
    };

    let report = lint(&config);

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("✓ Configuration is valid");
        println!("  url: {}", config.url);
        println!(
            "  formats: {}",
            config
                .report_formats
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "  notifications: {}",
            if config.notification().is_some() { "on" } else { "off" }
        );
        return ExitCode::SUCCESS;
    }

    if !report.errors.is_empty() {
        println!("\n❌ ERRORS (must fix):");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    if !report.warnings.is_empty() {
        println!("\n⚠️  WARNINGS:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    if report.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
