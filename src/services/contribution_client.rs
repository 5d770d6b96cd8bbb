use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::activity::ActivitySource;
use crate::models::settings::HeatmapConfig;
use crate::utils::redact::{mask_identity, redact_sensitive_data};

const GITHUB_CONTRIBUTIONS_QUERY: &str = r#"
query ($login: String!) {
    user(login: $login) {
        contributionsCollection {
            contributionCalendar {
                totalContributions
                weeks {
                    contributionDays {
                        contributionCount
                        date
                    }
                }
            }
        }
    }
}
"#;

const LEETCODE_CALENDAR_QUERY: &str = r#"
query ($username: String!) {
    matchedUser(username: $username) {
        submissionCalendar
    }
}
"#;

/// LeetCode rejects requests without a browser-like agent.
const LEETCODE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15";

/// A remote producer of raw contribution payloads.
#[async_trait]
pub trait ContributionFeed: Send + Sync {
    fn source(&self) -> ActivitySource;

    /// Fetch the raw upstream payload for `identity`.
    async fn fetch(&self, identity: &str) -> AppResult<JsonValue>;
}

fn build_http_client(source: ActivitySource, timeout: StdDuration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Some(StdDuration::from_secs(90)))
        .build()
        .map_err(|err| AppError::other(format!("failed to build {source} HTTP client: {err}")))
}

pub struct GitHubClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: StdDuration,
    ) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(ActivitySource::GitHub, timeout)?,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn from_config(config: &HeatmapConfig) -> AppResult<Self> {
        Self::new(
            config.github_api_url.clone(),
            config.github_token.clone(),
            config.http_timeout,
        )
    }
}

#[async_trait]
impl ContributionFeed for GitHubClient {
    fn source(&self) -> ActivitySource {
        ActivitySource::GitHub
    }

    async fn fetch(&self, identity: &str) -> AppResult<JsonValue> {
        let token = self.token.as_deref().ok_or_else(|| {
            AppError::configuration("GITHUB_TOKEN is required when GITHUB_USERNAME is set.")
        })?;

        let body = json!({
            "query": GITHUB_CONTRIBUTIONS_QUERY,
            "variables": { "login": identity },
        });
        let request = self.http.post(&self.endpoint).bearer_auth(token).json(&body);

        send_graphql(self.source(), identity, &body, request).await
    }
}

pub struct LeetCodeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl LeetCodeClient {
    pub fn new(endpoint: impl Into<String>, timeout: StdDuration) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(ActivitySource::LeetCode, timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &HeatmapConfig) -> AppResult<Self> {
        Self::new(config.leetcode_api_url.clone(), config.http_timeout)
    }
}

#[async_trait]
impl ContributionFeed for LeetCodeClient {
    fn source(&self) -> ActivitySource {
        ActivitySource::LeetCode
    }

    async fn fetch(&self, identity: &str) -> AppResult<JsonValue> {
        let body = json!({
            "query": LEETCODE_CALENDAR_QUERY,
            "variables": { "username": identity },
        });
        let request = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::USER_AGENT, LEETCODE_USER_AGENT)
            .json(&body);

        send_graphql(self.source(), identity, &body, request).await
    }
}

async fn send_graphql(
    source: ActivitySource,
    identity: &str,
    body: &JsonValue,
    request: reqwest::RequestBuilder,
) -> AppResult<JsonValue> {
    let correlation_id = Uuid::new_v4().to_string();
    let sanitized = redact_sensitive_data(body);

    debug!(
        target: "app::heatmap::client",
        source = source.as_str(),
        identity = %mask_identity(identity),
        correlation_id = %correlation_id,
        variables = %sanitized["variables"],
        "requesting contribution data"
    );

    let start = Instant::now();
    let response = request
        .send()
        .await
        .map_err(|err| error_from_reqwest(source, err))?;

    let status = response.status();
    if !status.is_success() {
        warn!(
            target: "app::heatmap::client",
            source = source.as_str(),
            correlation_id = %correlation_id,
            status = status.as_u16(),
            "upstream returned non-success status"
        );
        return Err(map_http_error(source, status));
    }

    let payload: JsonValue = response
        .json()
        .await
        .map_err(|err| error_from_reqwest(source, err))?;

    debug!(
        target: "app::heatmap::client",
        source = source.as_str(),
        correlation_id = %correlation_id,
        latency_ms = start.elapsed().as_millis() as u64,
        "upstream responded"
    );

    Ok(payload)
}

pub fn map_http_error(source: ActivitySource, status: StatusCode) -> AppError {
    let code = Some(status.as_u16());
    match status {
        StatusCode::NOT_FOUND => AppError::source_with_status(source, "user not found", code),
        StatusCode::FORBIDDEN if source == ActivitySource::GitHub => {
            AppError::source_with_status(source, "API rate limit exceeded", code)
        }
        StatusCode::TOO_MANY_REQUESTS => AppError::source_with_status(
            source,
            "Too many requests, please try again later",
            code,
        ),
        status => AppError::source_with_status(
            source,
            format!("Failed to fetch {} data (status {})", source.label(), status.as_u16()),
            code,
        ),
    }
}

fn error_from_reqwest(source: ActivitySource, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::timeout(source)
    } else if err.is_connect() {
        AppError::network(source, format!("connection failed: {err}"))
    } else if let Some(status) = err.status() {
        map_http_error(source, status)
    } else if err.is_decode() {
        AppError::source(source, format!("invalid response body: {err}"))
    } else {
        AppError::network(source, err.to_string())
    }
}
