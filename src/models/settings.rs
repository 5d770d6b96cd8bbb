use std::fmt;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use serde::Serialize;
use tracing::info;

use crate::error::AppResult;
use crate::utils::dates::CalendarZone;
use crate::utils::redact::mask_identity;

pub const ENV_GITHUB_USERNAME: &str = "GITHUB_USERNAME";
pub const ENV_LEETCODE_USERNAME: &str = "LEETCODE_USERNAME";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_API_URL: &str = "HEATMAP_GITHUB_API_URL";
pub const ENV_LEETCODE_API_URL: &str = "HEATMAP_LEETCODE_API_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HEATMAP_HTTP_TIMEOUT_SECS";
pub const ENV_TIMEZONE: &str = "HEATMAP_TIMEZONE";
pub const ENV_DB_PATH: &str = "PLANNER_DB_PATH";
pub const ENV_LOG_DIR: &str = "PLANNER_LOG_DIR";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_LEETCODE_API_URL: &str = "https://leetcode.com/graphql";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 8;

/// Identities and endpoints for the heatmap sources, read from the environment.
#[derive(Clone)]
pub struct HeatmapConfig {
    pub github_username: Option<String>,
    pub leetcode_username: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub leetcode_api_url: String,
    pub http_timeout: StdDuration,
    pub zone: CalendarZone,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            github_username: None,
            leetcode_username: None,
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            leetcode_api_url: DEFAULT_LEETCODE_API_URL.to_string(),
            http_timeout: StdDuration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            zone: CalendarZone::Local,
            db_path: PathBuf::from("planner.sqlite"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl fmt::Debug for HeatmapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeatmapConfig")
            .field("github_username", &self.github_username.as_deref().map(mask_identity))
            .field("leetcode_username", &self.leetcode_username.as_deref().map(mask_identity))
            .field("has_github_token", &self.github_token.is_some())
            .field("github_api_url", &self.github_api_url)
            .field("leetcode_api_url", &self.leetcode_api_url)
            .field("http_timeout", &self.http_timeout)
            .field("zone", &self.zone)
            .field("db_path", &self.db_path)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl HeatmapConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let zone = match read(ENV_TIMEZONE) {
            Some(name) => CalendarZone::from_name(&name)?,
            None => defaults.zone,
        };
        let http_timeout = read(ENV_HTTP_TIMEOUT_SECS)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(StdDuration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let config = Self {
            github_username: read(ENV_GITHUB_USERNAME),
            leetcode_username: read(ENV_LEETCODE_USERNAME),
            github_token: read(ENV_GITHUB_TOKEN),
            github_api_url: read(ENV_GITHUB_API_URL).unwrap_or(defaults.github_api_url),
            leetcode_api_url: read(ENV_LEETCODE_API_URL).unwrap_or(defaults.leetcode_api_url),
            http_timeout,
            zone,
            db_path: read(ENV_DB_PATH).map(PathBuf::from).unwrap_or(defaults.db_path),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from).unwrap_or(defaults.log_dir),
        };

        Ok(config)
    }

    /// Masked summary of what was loaded. Call once logging is initialized.
    pub fn log_summary(&self) {
        info!(
            target: "app::config",
            has_github_username = self.github_username.is_some(),
            has_leetcode_username = self.leetcode_username.is_some(),
            has_github_token = self.github_token.is_some(),
            github_username = ?self.github_username.as_deref().map(mask_identity),
            leetcode_username = ?self.leetcode_username.as_deref().map(mask_identity),
            zone = ?self.zone,
            "heatmap configuration loaded"
        );
    }

    /// The heatmap is on when at least one remote identity is configured.
    pub fn enabled(&self) -> bool {
        self.github_username.is_some() || self.leetcode_username.is_some()
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut errors = Vec::new();

        if !self.enabled() {
            errors.push(
                "No usernames configured. Set GITHUB_USERNAME or LEETCODE_USERNAME in environment variables."
                    .to_string(),
            );
            return ConfigValidation {
                valid: false,
                errors,
            };
        }

        if self.github_username.is_some() && self.github_token.is_none() {
            errors.push("GITHUB_TOKEN is required when GITHUB_USERNAME is set.".to_string());
        }

        ConfigValidation {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        match (&self.github_username, &self.leetcode_username) {
            (Some(_), None) => warnings.push(
                "Only GitHub username configured. LeetCode data will not be available.".to_string(),
            ),
            (None, Some(_)) => warnings.push(
                "Only LeetCode username configured. GitHub data will not be available.".to_string(),
            ),
            _ => {}
        }
        warnings
    }

    /// Configuration summary that is safe to hand to a client.
    pub fn status(&self) -> HeatmapConfigStatus {
        let validation = self.validate();
        HeatmapConfigStatus {
            enabled: self.enabled(),
            has_github_username: self.github_username.is_some(),
            has_leetcode_username: self.leetcode_username.is_some(),
            has_github_token: self.github_token.is_some(),
            valid: validation.valid,
            errors: validation.errors,
            warnings: self.warnings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapConfigStatus {
    pub enabled: bool,
    pub has_github_username: bool,
    pub has_leetcode_username: bool,
    pub has_github_token: bool,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
