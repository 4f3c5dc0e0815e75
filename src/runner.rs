//! One end-to-end check: scrape, analyse, render, persist, notify.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;

use crate::analysis::{analyse_assignments, Analysis};
use crate::config::Config;
use crate::notify::{notify_urgent, NotifyOutcome};
use crate::report::{ReportBuilder, Reports, SavedFiles};
use crate::scrapers::run_scraper;
use crate::types::{Assignment, ScrapeStatus};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub assignments: Vec<Assignment>,
    pub analysis: Analysis,
    pub reports: Reports,
    pub saved_files: SavedFiles,
    pub scrape_status: ScrapeStatus,
}

pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full pipeline under a single `run` span. `now` is captured once and
    /// drives both the analysis and the report file names.
    pub async fn execute(&self) -> Result<RunReport> {
        let now = Utc::now();
        let span = tracing::info_span!("run", url = %self.config.url, started_at = %now.format("%Y-%m-%dT%H:%M:%SZ"));

        async move {
            tracing::info!("Starting assignment check");
            let outcome = run_scraper(&self.config).await?;
            if outcome.status == ScrapeStatus::LoginFailed {
                tracing::warn!("Login failed, continuing with an empty assignment list");
            }
            self.process(outcome.assignments, outcome.status, now).await
        }
        .instrument(span)
        .await
    }

    /// Post-scrape half of the pipeline, usable with any assignment list.
    pub async fn process(
        &self,
        assignments: Vec<Assignment>,
        scrape_status: ScrapeStatus,
        now: DateTime<Utc>,
    ) -> Result<RunReport> {
        let config = &self.config;
        let analysis = analyse_assignments(&assignments, &config.priority_keywords, config.days_ahead, now);
        tracing::info!(
            total = analysis.total_assignments,
            urgent = analysis.urgent_count,
            overdue = analysis.overdue_count,
            pending = analysis.pending_count,
            "Analysis complete"
        );

        let builder = ReportBuilder::new(&config.output_dir, config.report_formats.clone(), now);
        let reports = builder.build(&assignments, &analysis);
        let saved_files = builder.persist(&reports)?;

        if let Some(smtp) = config.notification() {
            match notify_urgent(smtp, &analysis).await {
                Ok(NotifyOutcome::Sent) => tracing::info!("Urgent-assignment email sent"),
                Ok(NotifyOutcome::Skipped) => {}
                Err(e) => tracing::error!(error = %e, "Failed to send notification email"),
            }
        } else if config.notifications_requested {
            tracing::warn!("Notifications enabled but SMTP settings are incomplete, skipping email");
        }

        Ok(RunReport {
            assignments,
            analysis,
            reports,
            saved_files,
            scrape_status,
        })
    }
}
