use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use managebac_checker::config::{Config, ConfigLayer};
use managebac_checker::logger;
use managebac_checker::report::ReportFormat;
use managebac_checker::runner::Runner;
use managebac_checker::types::ScrapeStatus;

#[derive(Parser, Debug)]
#[command(
    name = "managebac_checker",
    about = "Check ManageBac for pending, overdue and urgent assignments",
    version
)]
struct Cli {
    /// YAML config file (defaults to $MANAGEBAC_CONFIG when set)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Verbose logging and a page-structure dump after login
    #[arg(long)]
    debug: bool,
    /// Run the browser headless (true/false)
    #[arg(long)]
    headless: Option<bool>,
    /// Report formats, comma separated: console, json, markdown, html
    #[arg(long, value_delimiter = ',')]
    format: Option<Vec<String>>,
    /// Directory for saved reports
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Open each assignment's page to capture its description
    #[arg(long)]
    fetch_details: bool,
    /// Maximum number of descriptions to capture
    #[arg(long)]
    details_limit: Option<usize>,
    /// Window, in days, for the "soon" bucket
    #[arg(long)]
    days_ahead: Option<i64>,
    /// WebDriver endpoint (chromedriver)
    #[arg(long)]
    webdriver_url: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            debug: self.debug.then_some(true),
            headless: self.headless,
            report_formats: self.format.clone(),
            output_dir: self.output_dir.clone(),
            fetch_details: self.fetch_details.then_some(true),
            details_limit: self.details_limit,
            days_ahead: self.days_ahead,
            webdriver_url: self.webdriver_url.clone(),
            ..ConfigLayer::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    logger::init_logging(config.debug);
    tracing::debug!(?config, "Loaded configuration");

    let runner = Runner::new(config);
    let report = match runner.execute().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Assignment check failed");
            return ExitCode::from(1);
        }
    };

    if let Some(console) = report.reports.get(&ReportFormat::Console) {
        println!("{}", console);
    }

    if report.saved_files.is_empty() {
        println!("No report files written");
    } else {
        println!("Saved reports:");
        for (format, path) in &report.saved_files {
            println!("  - {}: {}", format, path.display());
        }
    }

    match report.scrape_status {
        ScrapeStatus::Completed => ExitCode::SUCCESS,
        ScrapeStatus::LoginFailed => {
            eprintln!("Login failed; check MANAGEBAC_EMAIL and MANAGEBAC_PASSWORD");
            ExitCode::from(2)
        }
    }
}
