use serde::{Deserialize, Serialize};

use crate::models::activity::{ActivitySource, CombinedActivityPoint, HeatmapStats};
use crate::models::productivity::ProductivityMetrics;
use crate::utils::dates::DateKey;

/// How a single source branch of a dashboard request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceStatus {
    /// Fetched from upstream during this request.
    Fresh,
    /// Served from a still-valid cache entry; no upstream call.
    Cached,
    /// Upstream failed; served from the long-lived fallback copy.
    Stale,
    /// Upstream failed and nothing was cached.
    Failed,
    /// No identity configured; nothing was attempted.
    Skipped,
}

impl SourceStatus {
    pub fn has_data(self) -> bool {
        matches!(self, SourceStatus::Fresh | SourceStatus::Cached | SourceStatus::Stale)
    }

    pub fn was_attempted(self) -> bool {
        self != SourceStatus::Skipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub source: ActivitySource,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub combined_data: Vec<CombinedActivityPoint>,
    pub stats: HeatmapStats,
    pub productivity: ProductivityMetrics,
    pub sources: Vec<SourceReport>,
    /// True when at least one source was answered from the fallback copy.
    pub stale: bool,
    /// Summary of failed or stale sources, e.g. `LeetCode: user not found`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: String,
}

/// Gap-filled 12-month grid for calendar rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub start: DateKey,
    pub end: DateKey,
    pub days: Vec<CombinedActivityPoint>,
    pub stats: HeatmapStats,
    pub sources: Vec<SourceReport>,
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
