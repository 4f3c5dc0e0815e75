mod browser;
pub mod extract;
pub mod text_scan;

use std::future::Future;

use anyhow::Result;
use chrono::Utc;

use crate::classify::normalize_keywords;
use crate::config::Config;
use crate::sorter::sort_assignments;
use crate::types::{Assignment, ScrapeStatus};

pub use browser::{is_assignments_url, is_logged_in_url, BrowserSession};
pub use extract::{extract_assignments, is_noise, resolve_link, ExtractContext, PageSnapshot};

#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub assignments: Vec<Assignment>,
    pub status: ScrapeStatus,
}

/// Logs in, finds the assignment list and extracts it. The browser is
/// released whatever happens.
pub async fn run_scraper(config: &Config) -> Result<ScrapeOutcome> {
    let session = BrowserSession::launch(config).await?;
    let result = scrape_with_session(&session, config).await;
    session.quit().await;
    result
}

async fn scrape_with_session(session: &BrowserSession, config: &Config) -> Result<ScrapeOutcome> {
    session.open_portal().await?;

    if !session.login(&config.email, &config.password).await {
        return Ok(ScrapeOutcome {
            assignments: Vec::new(),
            status: ScrapeStatus::LoginFailed,
        });
    }

    if config.debug {
        session.dump_page_structure().await;
    }

    session.navigate_to_assignments().await;
    session.show_all().await;
    session.wait_for_settle().await;

    let snapshot = match session.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(error = %e, "Failed to capture the assignments page");
            return Ok(ScrapeOutcome {
                assignments: Vec::new(),
                status: ScrapeStatus::Completed,
            });
        }
    };

    let keywords = normalize_keywords(&config.priority_keywords);
    let ctx = ExtractContext {
        priority_keywords: &keywords,
        fetched_at: Utc::now(),
    };
    let mut assignments = extract_assignments(&snapshot, &ctx);
    tracing::info!(count = assignments.len(), "Extracted assignments");

    if config.fetch_details {
        enrich_assignments(
            &mut assignments,
            config.base_url(),
            config.details_limit,
            |url| async move { session.fetch_description(&url).await },
        )
        .await;
    }

    Ok(ScrapeOutcome {
        assignments: finalize(assignments),
        status: ScrapeStatus::Completed,
    })
}

/// Drops noise records and applies the final ordering.
pub fn finalize(assignments: Vec<Assignment>) -> Vec<Assignment> {
    let before = assignments.len();
    let mut kept: Vec<Assignment> = assignments.into_iter().filter(|a| !is_noise(a)).collect();
    if kept.len() != before {
        tracing::debug!(dropped = before - kept.len(), "Dropped noise records");
    }
    sort_assignments(&mut kept);
    kept
}

/// Fills `description` from detail pages; stops after `limit` successes.
/// `fetch` receives the absolute detail-page URL.
async fn enrich_assignments<F, Fut>(assignments: &mut [Assignment], base_url: &str, limit: usize, mut fetch: F)
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    let mut enriched = 0;
    for assignment in assignments.iter_mut() {
        if enriched >= limit {
            break;
        }
        let Some(link) = assignment.link.as_deref() else {
            continue;
        };
        let url = resolve_link(base_url, link);

        match fetch(url.clone()).await {
            Ok(Some(description)) => {
                assignment.description = Some(description);
                enriched += 1;
            }
            Ok(None) => tracing::debug!(url = %url, "No description found"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Failed to fetch assignment details"),
        }
    }
    tracing::info!(enriched, "Assignment details fetched");
}
