//! Configuration
//!
//! Settings are layered, lowest to highest precedence:
//! built-in defaults, an optional YAML file, environment variables (a `.env`
//! file is loaded first), then command-line overrides. Missing credentials
//! reject the configuration before any browser is started.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::report::ReportFormat;
use crate::storage;

pub const DEFAULT_URL: &str = "https://shtcs.managebac.cn";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_DETAILS_LIMIT: usize = 10;
pub const DEFAULT_DAYS_AHEAD: i64 = 7;
pub const MAX_DAYS_AHEAD: i64 = 3_650;
pub const MAX_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_OUTPUT_DIR: &str = "./reports";
pub const DEFAULT_REPORT_FORMATS: &[&str] = &["console", "json"];
pub const DEFAULT_PRIORITY_KEYWORDS: &[&str] = &["exam", "test", "project", "essay"];

/// Env var naming the YAML config file when `--config` is not given.
pub const CONFIG_PATH_VAR: &str = "MANAGEBAC_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MANAGEBAC_EMAIL and MANAGEBAC_PASSWORD must be set (in the environment, .env or config file)")]
    MissingCredentials,
    #[error("{key} must be a whole number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },
    #[error("days_ahead must be between 0 and {}, got {0}", MAX_DAYS_AHEAD)]
    DaysAheadOutOfRange(i64),
    #[error("timeout must be between 1 and {} ms, got {0}", MAX_TIMEOUT_MS)]
    TimeoutOutOfRange(u64),
    #[error("could not load config file {path:?}: {message}")]
    File { path: PathBuf, message: String },
}

/// One layer of optional settings. Used for the YAML file and for CLI
/// overrides; the environment is read into the same shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub url: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub headless: Option<bool>,
    pub timeout: Option<u64>,
    pub debug: Option<bool>,
    pub report_formats: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub fetch_details: Option<bool>,
    pub details_limit: Option<usize>,
    pub days_ahead: Option<i64>,
    pub priority_keywords: Option<Vec<String>>,
    pub webdriver_url: Option<String>,
    pub enable_notifications: Option<bool>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub email_user: Option<String>,
    pub email_password: Option<String>,
    pub notification_email: Option<String>,
}

macro_rules! merge_fields {
    ($target:expr, $layer:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $layer.$field {
                $target.$field = Some(value);
            }
        )+
    };
}

impl ConfigLayer {
    /// Values set in `higher` replace the ones in `self`.
    pub fn merge(&mut self, higher: ConfigLayer) {
        merge_fields!(self, higher;
            url, email, password, headless, timeout, debug, report_formats,
            output_dir, fetch_details, details_limit, days_ahead,
            priority_keywords, webdriver_url, enable_notifications,
            smtp_server, smtp_port, email_user, email_password,
            notification_email,
        );
    }

    /// Reads the environment variable names the checker has always used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            url: get("MANAGEBAC_URL"),
            email: get("MANAGEBAC_EMAIL"),
            password: get("MANAGEBAC_PASSWORD"),
            headless: parse_bool("HEADLESS", get("HEADLESS"))?,
            timeout: parse_number("TIMEOUT", get("TIMEOUT"))?,
            debug: parse_bool("DEBUG", get("DEBUG"))?,
            report_formats: get("REPORT_FORMAT").map(|v| split_list(&v)),
            output_dir: get("OUTPUT_DIR").map(PathBuf::from),
            fetch_details: parse_bool("FETCH_DETAILS", get("FETCH_DETAILS"))?,
            details_limit: parse_number("DETAILS_LIMIT", get("DETAILS_LIMIT"))?,
            days_ahead: parse_number("DAYS_AHEAD", get("DAYS_AHEAD"))?,
            priority_keywords: get("PRIORITY_KEYWORDS").map(|v| split_list(&v)),
            webdriver_url: get("WEBDRIVER_URL"),
            enable_notifications: parse_bool("ENABLE_NOTIFICATIONS", get("ENABLE_NOTIFICATIONS"))?,
            smtp_server: get("SMTP_SERVER"),
            smtp_port: parse_number("SMTP_PORT", get("SMTP_PORT"))?,
            email_user: get("EMAIL_USER"),
            email_password: get("EMAIL_PASSWORD"),
            notification_email: get("NOTIFICATION_EMAIL"),
        })
    }
}

/// Outgoing mail settings. Present only when every field was configured.
#[derive(Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Validated settings for one run.
#[derive(Clone)]
pub struct Config {
    pub url: String,
    pub email: String,
    pub password: String,
    pub headless: bool,
    /// Per-operation budget in milliseconds.
    pub timeout_ms: u64,
    pub debug: bool,
    pub report_formats: Vec<ReportFormat>,
    pub output_dir: PathBuf,
    pub fetch_details: bool,
    pub details_limit: usize,
    pub days_ahead: i64,
    pub priority_keywords: Vec<String>,
    pub webdriver_url: String,
    /// True when notifications were requested, even if SMTP is incomplete.
    pub notifications_requested: bool,
    pub smtp: Option<SmtpSettings>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("headless", &self.headless)
            .field("timeout_ms", &self.timeout_ms)
            .field("debug", &self.debug)
            .field("report_formats", &self.report_formats)
            .field("output_dir", &self.output_dir)
            .field("fetch_details", &self.fetch_details)
            .field("details_limit", &self.details_limit)
            .field("days_ahead", &self.days_ahead)
            .field("priority_keywords", &self.priority_keywords)
            .field("webdriver_url", &self.webdriver_url)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl Config {
    /// Loads `.env`, the YAML file (from `config_path` or `MANAGEBAC_CONFIG`),
    /// the process environment, then applies `overrides`.
    pub fn load(config_path: Option<&Path>, overrides: ConfigLayer) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_VAR).ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from));

        let file_layer = match path {
            Some(path) => Some(storage::load_config_file(&path).map_err(|err| ConfigError::File {
                message: format!("{:#}", err),
                path,
            })?),
            None => None,
        };

        let env_layer = ConfigLayer::from_lookup(|key| env::var(key).ok())?;
        Self::from_layers(file_layer, env_layer, overrides)
    }

    /// Resolves the final settings from already-read layers.
    pub fn from_layers(
        file: Option<ConfigLayer>,
        environment: ConfigLayer,
        overrides: ConfigLayer,
    ) -> Result<Self, ConfigError> {
        let mut merged = file.unwrap_or_default();
        merged.merge(environment);
        merged.merge(overrides);
        Self::from_layer(merged)
    }

    fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let email = layer.email.filter(|v| !v.trim().is_empty());
        let password = layer.password.filter(|v| !v.is_empty());
        let (email, password) = match (email, password) {
            (Some(email), Some(password)) => (email, password),
            _ => return Err(ConfigError::MissingCredentials),
        };

        let days_ahead = layer.days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD);
        if !(0..=MAX_DAYS_AHEAD).contains(&days_ahead) {
            return Err(ConfigError::DaysAheadOutOfRange(days_ahead));
        }

        let timeout_ms = layer.timeout.unwrap_or(DEFAULT_TIMEOUT_MS);
        if !(1..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
            return Err(ConfigError::TimeoutOutOfRange(timeout_ms));
        }

        let format_names = layer
            .report_formats
            .unwrap_or_else(|| DEFAULT_REPORT_FORMATS.iter().map(|s| s.to_string()).collect());
        let priority_keywords = layer
            .priority_keywords
            .unwrap_or_else(|| DEFAULT_PRIORITY_KEYWORDS.iter().map(|s| s.to_string()).collect());

        let notifications_requested = layer.enable_notifications.unwrap_or(false);
        let smtp = if notifications_requested {
            match (
                layer.smtp_server,
                layer.email_user,
                layer.email_password,
                layer.notification_email,
            ) {
                (Some(server), Some(username), Some(password), Some(recipient)) => Some(SmtpSettings {
                    server,
                    port: layer.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
                    username,
                    password,
                    recipient,
                }),
                _ => None,
            }
        } else {
            None
        };

        Ok(Self {
            url: layer.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            email,
            password,
            headless: layer.headless.unwrap_or(true),
            timeout_ms,
            debug: layer.debug.unwrap_or(false),
            report_formats: ReportFormat::parse_list(&format_names),
            output_dir: layer
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            fetch_details: layer.fetch_details.unwrap_or(false),
            details_limit: layer.details_limit.unwrap_or(DEFAULT_DETAILS_LIMIT),
            days_ahead,
            priority_keywords,
            webdriver_url: layer
                .webdriver_url
                .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            notifications_requested,
            smtp,
        })
    }

    /// SMTP settings when notifications are enabled and complete.
    pub fn notification(&self) -> Option<&SmtpSettings> {
        self.smtp.as_ref()
    }

    /// Base URL without a trailing slash, for joining paths.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Comma-separated list; blanks dropped.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidBool { key, value: raw }),
        },
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}

/// Problems found in an otherwise loadable configuration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Checks that do not stop loading but will break or degrade a run.
pub fn lint(config: &Config) -> LintReport {
    let mut report = LintReport::default();

    if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
        report
            .errors
            .push(format!("url has no http/https scheme: {}", config.url));
    }
    if !config.webdriver_url.starts_with("http://") && !config.webdriver_url.starts_with("https://") {
        report
            .errors
            .push(format!("webdriver_url has no http/https scheme: {}", config.webdriver_url));
    }
    if !config.email.contains('@') {
        report
            .warnings
            .push(format!("email does not look like an address: {}", config.email));
    }
    if config.report_formats.is_empty() {
        report
            .warnings
            .push("no known report formats requested; nothing will be rendered".to_string());
    }
    if config.timeout_ms < 1_000 {
        report.warnings.push(format!(
            "timeout of {} ms is very short; pages may not finish loading",
            config.timeout_ms
        ));
    }
    if config.fetch_details && config.details_limit == 0 {
        report
            .warnings
            .push("fetch_details is on but details_limit is 0".to_string());
    }
    if config.notifications_requested && config.smtp.is_none() {
        report.warnings.push(
            "notifications enabled but SMTP_SERVER, EMAIL_USER, EMAIL_PASSWORD or NOTIFICATION_EMAIL is missing"
                .to_string(),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_layer(pairs: &[(&str, &str)]) -> Result<ConfigLayer, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLayer::from_lookup(|key| map.get(key).cloned())
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MANAGEBAC_EMAIL", "student@example.com"),
            ("MANAGEBAC_PASSWORD", "secret"),
        ]
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_layers(None, env_layer(&credentials()).unwrap(), ConfigLayer::default()).unwrap();
        assert_eq!(config.url, DEFAULT_URL);
        assert!(config.headless);
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.report_formats, vec![ReportFormat::Console, ReportFormat::Json]);
        assert_eq!(config.days_ahead, 7);
        assert_eq!(config.details_limit, 10);
        assert_eq!(config.priority_keywords, vec!["exam", "test", "project", "essay"]);
        assert!(config.notification().is_none());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = Config::from_layers(None, env_layer(&[("MANAGEBAC_EMAIL", "a@b.c")]).unwrap(), ConfigLayer::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn test_environment_values_parse() {
        let mut pairs = credentials();
        pairs.extend([
            ("REPORT_FORMAT", "console, html,,json"),
            ("HEADLESS", "false"),
            ("DAYS_AHEAD", "14"),
            ("OUTPUT_DIR", "/tmp/out"),
        ]);
        let config = Config::from_layers(None, env_layer(&pairs).unwrap(), ConfigLayer::default()).unwrap();
        assert!(!config.headless);
        assert_eq!(config.days_ahead, 14);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            config.report_formats,
            vec![ReportFormat::Console, ReportFormat::Html, ReportFormat::Json]
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            env_layer(&[("TIMEOUT", "soon")]),
            Err(ConfigError::InvalidNumber { key: "TIMEOUT", .. })
        ));
        assert!(matches!(
            env_layer(&[("HEADLESS", "maybe")]),
            Err(ConfigError::InvalidBool { key: "HEADLESS", .. })
        ));
    }

    #[test]
    fn test_days_ahead_bounds() {
        let with_days = |days: &'static str| {
            let mut pairs = credentials();
            pairs.push(("DAYS_AHEAD", days));
            Config::from_layers(None, env_layer(&pairs).unwrap(), ConfigLayer::default())
        };

        assert_eq!(with_days("0").unwrap().days_ahead, 0);
        assert_eq!(with_days("3650").unwrap().days_ahead, MAX_DAYS_AHEAD);
        assert!(matches!(with_days("-1"), Err(ConfigError::DaysAheadOutOfRange(-1))));
        assert!(matches!(
            with_days("1000000000"),
            Err(ConfigError::DaysAheadOutOfRange(1_000_000_000))
        ));
    }

    #[test]
    fn test_timeout_bounds() {
        let with_timeout = |ms: &'static str| {
            let mut pairs = credentials();
            pairs.push(("TIMEOUT", ms));
            Config::from_layers(None, env_layer(&pairs).unwrap(), ConfigLayer::default())
        };

        assert_eq!(with_timeout("600000").unwrap().timeout_ms, MAX_TIMEOUT_MS);
        assert!(matches!(with_timeout("0"), Err(ConfigError::TimeoutOutOfRange(0))));
        assert!(matches!(
            with_timeout("18446744073709551615"),
            Err(ConfigError::TimeoutOutOfRange(u64::MAX))
        ));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let file: ConfigLayer = serde_yaml::from_str(
            "email: file@example.com\npassword: from-file\ndays_ahead: 3\nreport_formats: [html]\n",
        )
        .unwrap();
        let environment = env_layer(&[("MANAGEBAC_EMAIL", "env@example.com"), ("DAYS_AHEAD", "5")]).unwrap();
        let overrides = ConfigLayer {
            email: Some("override@example.com".to_string()),
            headless: Some(false),
            report_formats: Some(vec!["json".to_string()]),
            ..ConfigLayer::default()
        };

        let config = Config::from_layers(Some(file), environment, overrides).unwrap();
        assert_eq!(config.email, "override@example.com");
        assert_eq!(config.password, "from-file");
        assert_eq!(config.days_ahead, 5);
        assert!(!config.headless);
        assert_eq!(config.report_formats, vec![ReportFormat::Json]);
    }

    #[test]
    fn test_incomplete_smtp_disables_notifications() {
        let mut pairs = credentials();
        pairs.extend([("ENABLE_NOTIFICATIONS", "true"), ("SMTP_SERVER", "smtp.example.com")]);
        let config = Config::from_layers(None, env_layer(&pairs).unwrap(), ConfigLayer::default()).unwrap();
        assert!(config.notifications_requested);
        assert!(config.notification().is_none());

        pairs.extend([
            ("EMAIL_USER", "bot@example.com"),
            ("EMAIL_PASSWORD", "pw"),
            ("NOTIFICATION_EMAIL", "parent@example.com"),
        ]);
        let config = Config::from_layers(None, env_layer(&pairs).unwrap(), ConfigLayer::default()).unwrap();
        let smtp = config.notification().unwrap();
        assert_eq!(smtp.port, 587);
        assert!(!format!("{:?}", config).contains("secret"));
        assert!(!format!("{:?}", smtp).contains("\"pw\""));
    }

    #[test]
    fn test_lint_flags_problems() {
        let mut pairs = credentials();
        pairs.extend([
            ("MANAGEBAC_URL", "school.managebac.cn"),
            ("REPORT_FORMAT", "pdf"),
            ("ENABLE_NOTIFICATIONS", "yes"),
        ]);
        let config = Config::from_layers(None, env_layer(&pairs).unwrap(), ConfigLayer::default()).unwrap();
        let report = lint(&config);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("url has no http/https scheme"));
        assert_eq!(report.warnings.len(), 2);

        let clean = Config::from_layers(None, env_layer(&credentials()).unwrap(), ConfigLayer::default()).unwrap();
        assert_eq!(lint(&clean), LintReport::default());
    }
}
