use std::time::Duration;

use anyhow::{Context, Result};
use thirtyfour::prelude::*;

use crate::config::Config;

use super::extract::PageSnapshot;

/// Budget for each optional selector candidate.
const CANDIDATE_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const CLICK_SETTLE: Duration = Duration::from_millis(800);
const MAX_DEBUG_LINKS: usize = 10;

const EMAIL_FIELD: &str = "input[type=email], input[name=email], #email, input[name*=login]";
const PASSWORD_FIELD: &str = "input[type=password], input[name=password]";
const ERROR_BANNER: &str = ".error, .alert-danger, [class*=error]";

#[derive(Debug, Clone, Copy)]
enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

impl Locator {
    fn by(self) -> By {
        match self {
            Locator::Css(css) => By::Css(css),
            Locator::XPath(xpath) => By::XPath(xpath),
        }
    }
}

const SUBMIT_CANDIDATES: &[Locator] = &[
    Locator::Css("button[type=submit]"),
    Locator::Css("input[type=submit]"),
    Locator::XPath("//button[contains(normalize-space(.), 'Login')]"),
    Locator::XPath("//button[contains(normalize-space(.), 'Log in')]"),
    Locator::XPath("//button[contains(normalize-space(.), 'Sign in')]"),
    Locator::Css(".btn-primary"),
];

const ASSIGNMENT_LINK_CANDIDATES: &[Locator] = &[
    Locator::Css("a[href*=tasks_and_deadlines]"),
    Locator::XPath("//a[contains(normalize-space(.), 'Tasks & Deadlines')]"),
    Locator::XPath("//a[contains(normalize-space(.), 'Deadlines')]"),
    Locator::Css("a[href*=assignment]"),
    Locator::Css("a[href*=homework]"),
    Locator::Css("a[href*=task]"),
    Locator::XPath("//a[contains(normalize-space(.), 'Assignment')]"),
    Locator::XPath("//a[contains(normalize-space(.), 'Homework')]"),
    Locator::XPath("//a[contains(normalize-space(.), 'Tasks')]"),
    Locator::XPath("//a[contains(normalize-space(.), '作业')]"),
    Locator::XPath("//a[contains(normalize-space(.), '待办')]"),
];

const FALLBACK_PATHS: &[&str] = &[
    "/student/tasks_and_deadlines",
    "/assignments",
    "/student/assignments",
    "/homework",
    "/tasks",
    "/dashboard/assignments",
    "/student/dashboard/assignments",
];

const ALL_FILTER_CANDIDATES: &[Locator] = &[
    Locator::XPath("//a[normalize-space(.)='All'] | //button[normalize-space(.)='All']"),
    Locator::XPath("//a[normalize-space(.)='全部'] | //button[normalize-space(.)='全部']"),
];

const CONTENT_SELECTORS: &[&str] = &[
    ".description",
    ".assignment-description",
    ".instructions",
    ".content",
    "main",
];

const ASSIGNMENT_URL_HINTS: &[&str] = &["tasks", "assignment", "homework"];
const LINK_DUMP_HINTS: &[&str] = &["assignment", "task", "homework", "deadline"];

/// `start + timeout`, or `None` when the sum is not representable.
fn settle_deadline(start: tokio::time::Instant, timeout: Duration) -> Option<tokio::time::Instant> {
    start.checked_add(timeout)
}

/// True once the browser has left the login form.
pub fn is_logged_in_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    !lowered.contains("login") && !lowered.contains("signin")
}

pub fn is_assignments_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    ASSIGNMENT_URL_HINTS.iter().any(|hint| lowered.contains(hint))
}

/// One Chrome window driven over WebDriver for the whole run.
pub struct BrowserSession {
    driver: WebDriver,
    base_url: String,
    timeout: Duration,
}

impl BrowserSession {
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut args = vec![
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--window-size=1920,1080",
            "--disable-blink-features=AutomationControlled",
        ];
        if config.headless {
            args.insert(0, "--headless=new");
        }

        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", args)?;

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .with_context(|| format!("Failed to connect to WebDriver at {}", config.webdriver_url))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        if let Err(e) = driver.set_page_load_timeout(timeout).await {
            tracing::warn!(error = %e, "Failed to set page load timeout");
        }

        tracing::info!(webdriver = %config.webdriver_url, headless = config.headless, "Browser session started");

        Ok(Self {
            driver,
            base_url: config.base_url().to_string(),
            timeout,
        })
    }

    /// Initial page load; the only navigation whose failure aborts the run.
    pub async fn open_portal(&self) -> Result<()> {
        self.driver
            .goto(&self.base_url)
            .await
            .with_context(|| format!("Failed to load {}", self.base_url))?;
        Ok(())
    }

    pub async fn current_url(&self) -> String {
        match self.driver.current_url().await {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read current URL");
                String::new()
            }
        }
    }

    /// Fills the login form and reports whether the portal let us in.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        tracing::info!("Logging in");

        let email_field = match self
            .driver
            .query(By::Css(EMAIL_FIELD))
            .wait(self.timeout, POLL_INTERVAL)
            .first()
            .await
        {
            Ok(field) => field,
            Err(e) => {
                tracing::error!(error = %e, "Email field not found");
                return false;
            }
        };

        if let Err(e) = fill(&email_field, email).await {
            tracing::error!(error = %e, "Failed to fill email field");
            return false;
        }

        let password_field = match self.driver.find(By::Css(PASSWORD_FIELD)).await {
            Ok(field) => field,
            Err(e) => {
                tracing::error!(error = %e, "Password field not found");
                return false;
            }
        };

        if let Err(e) = fill(&password_field, password).await {
            tracing::error!(error = %e, "Failed to fill password field");
            return false;
        }

        match self.click_first(SUBMIT_CANDIDATES).await {
            Some(locator) => tracing::debug!(?locator, "Clicked submit button"),
            None => {
                tracing::debug!("No submit button matched, pressing Enter");
                if let Err(e) = password_field.send_keys("" + Key::Enter).await {
                    tracing::warn!(error = %e, "Failed to submit login form");
                }
            }
        }

        self.wait_for_settle().await;

        let url = self.current_url().await;
        if is_logged_in_url(&url) {
            tracing::info!(url = %url, "Login succeeded");
            return true;
        }

        if let Ok(banner) = self.driver.find(By::Css(ERROR_BANNER)).await {
            if let Ok(text) = banner.text().await {
                let text = text.trim();
                if !text.is_empty() {
                    tracing::warn!(message = text, "Login page reported an error");
                }
            }
        }
        tracing::error!(url = %url, "Login failed");
        false
    }

    /// Clicks through to the assignment list, falling back to known paths.
    /// Returns whether the resulting URL looks like an assignment view.
    pub async fn navigate_to_assignments(&self) -> bool {
        if let Some(locator) = self.click_first(ASSIGNMENT_LINK_CANDIDATES).await {
            self.wait_for_settle().await;
            let url = self.current_url().await;
            if is_assignments_url(&url) {
                tracing::info!(url = %url, ?locator, "Reached assignments via link");
                return true;
            }
        }

        let base = self.base_url.trim_end_matches('/');
        for path in FALLBACK_PATHS {
            let target = format!("{}{}", base, path);
            if let Err(e) = self.driver.goto(&target).await {
                tracing::debug!(url = %target, error = %e, "Fallback path failed");
                continue;
            }
            self.wait_for_settle().await;
            let url = self.current_url().await;
            if is_assignments_url(&url) {
                tracing::info!(url = %url, "Reached assignments via direct path");
                return true;
            }
        }

        tracing::warn!("Could not confirm the assignments page, extracting from the current page");
        false
    }

    /// Switches the list to show submitted and unsubmitted items alike.
    pub async fn show_all(&self) {
        if let Some(locator) = self.click_first(ALL_FILTER_CANDIDATES).await {
            tracing::debug!(?locator, "Selected the All filter");
            tokio::time::sleep(CLICK_SETTLE).await;
        }
    }

    /// Polls `document.readyState` until complete; giving up is not an error.
    pub async fn wait_for_settle(&self) {
        let deadline = settle_deadline(tokio::time::Instant::now(), self.timeout);
        loop {
            match self.driver.execute("return document.readyState", vec![]).await {
                Ok(ret) if ret.json().as_str() == Some("complete") => return,
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "readyState probe failed"),
            }
            if deadline.is_some_and(|deadline| tokio::time::Instant::now() >= deadline) {
                tracing::debug!("Page did not settle before the timeout");
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Logs URL, title and navigation links that look assignment-related.
    pub async fn dump_page_structure(&self) {
        let url = self.current_url().await;
        let title = self.driver.title().await.unwrap_or_default();
        tracing::debug!(url = %url, title = %title, "Page structure");

        let links = match self.driver.find_all(By::Tag("a")).await {
            Ok(links) => links,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to list links");
                return;
            }
        };

        let mut shown = 0;
        for link in links {
            if shown >= MAX_DEBUG_LINKS {
                break;
            }
            let text = link.text().await.unwrap_or_default();
            let href = link.attr("href").await.ok().flatten().unwrap_or_default();
            let haystack = format!("{} {}", text, href).to_lowercase();
            if LINK_DUMP_HINTS.iter().any(|hint| haystack.contains(hint)) {
                tracing::debug!(text = text.trim(), href = %href, "Navigation link");
                shown += 1;
            }
        }
    }

    pub async fn snapshot(&self) -> Result<PageSnapshot> {
        let html = self.driver.source().await.context("Failed to get page source")?;
        let body_text = match self.driver.find(By::Tag("body")).await {
            Ok(body) => body.text().await.unwrap_or_default(),
            Err(_) => String::new(),
        };
        Ok(PageSnapshot {
            url: self.current_url().await,
            html,
            body_text,
        })
    }

    /// Visits a detail page and returns its main content text, if any.
    pub async fn fetch_description(&self, url: &str) -> Result<Option<String>> {
        self.driver
            .goto(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;
        tokio::time::sleep(CLICK_SETTLE).await;

        for css in CONTENT_SELECTORS {
            if let Ok(element) = self.driver.find(By::Css(*css)).await {
                let text = element.text().await.unwrap_or_default();
                let text = text.trim();
                if !text.is_empty() {
                    return Ok(Some(text.to_string()));
                }
            }
        }
        Ok(None)
    }

    async fn click_first(&self, candidates: &[Locator]) -> Option<Locator> {
        for locator in candidates {
            let Ok(element) = self
                .driver
                .query(locator.by())
                .wait(CANDIDATE_TIMEOUT, POLL_INTERVAL)
                .first()
                .await
            else {
                continue;
            };
            match element.click().await {
                Ok(()) => return Some(*locator),
                Err(e) => tracing::debug!(?locator, error = %e, "Candidate click failed"),
            }
        }
        None
    }

    pub async fn quit(self) {
        if let Err(e) = self.driver.quit().await {
            tracing::warn!(error = %e, "Failed to quit browser");
        }
    }
}

async fn fill(field: &WebElement, value: &str) -> WebDriverResult<()> {
    field.clear().await?;
    field.send_keys(value).await
}
