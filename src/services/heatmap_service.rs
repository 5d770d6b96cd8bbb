//! Dashboard orchestration: fetch three sources independently, merge, derive stats.
//!
//! Remote branches go through the shared [`ResponseCache`]. A fresh copy answers requests
//! while its TTL lasts; a longer-lived fallback copy answers them when upstream fails.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde_json::Value as JsonValue;
use tokio::task;
use tracing::{debug, info, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::activity::{ActivityPoint, ActivitySource, HeatmapStats};
use crate::models::heatmap::{CalendarResponse, DashboardResponse, SourceReport, SourceStatus};
use crate::models::productivity::ProductivityMetrics;
use crate::models::settings::{HeatmapConfig, HeatmapConfigStatus};
use crate::services::cache_key::ResponseCacheKey;
use crate::services::cache_service::ResponseCache;
use crate::services::combiner::{combine, fill_missing_dates, heatmap_date_range};
use crate::services::contribution_client::{ContributionFeed, GitHubClient, LeetCodeClient};
use crate::services::productivity_service::{calculate_metrics, ProductivityService};
use crate::services::streak_calculator;
use crate::services::transformers::{transform_github, transform_leetcode};
use crate::utils::clock::Clock;
use crate::utils::dates::{CalendarZone, DateKey};
use crate::utils::redact::mask_identity;

pub type ActivityCache = ResponseCache<Vec<ActivityPoint>>;

type Transformer = fn(&JsonValue, &CalendarZone) -> AppResult<Vec<ActivityPoint>>;

/// Slack on top of the HTTP client's own timeout before a branch is abandoned.
const BRANCH_TIMEOUT_GRACE: StdDuration = StdDuration::from_millis(500);

struct RemoteBranch {
    feed: Arc<dyn ContributionFeed>,
    identity: Option<String>,
    transform: Transformer,
}

struct BranchOutcome {
    source: ActivitySource,
    status: SourceStatus,
    points: Vec<ActivityPoint>,
    error: Option<AppError>,
}

impl BranchOutcome {
    fn skipped(source: ActivitySource) -> Self {
        Self {
            source,
            status: SourceStatus::Skipped,
            points: Vec::new(),
            error: None,
        }
    }

    /// Error text prefixed with the source label unless the error already names one.
    fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|error| match error.origin() {
            Some(_) => error.to_string(),
            None => format!("{}: {}", self.source, error),
        })
    }

    fn report(&self) -> SourceReport {
        SourceReport {
            source: self.source,
            status: self.status,
            error: self.error_message(),
        }
    }
}

pub struct HeatmapService {
    config: HeatmapConfig,
    cache: Arc<ActivityCache>,
    github: RemoteBranch,
    leetcode: RemoteBranch,
    productivity: Arc<ProductivityService>,
    clock: Arc<dyn Clock>,
}

impl HeatmapService {
    pub fn new(
        config: HeatmapConfig,
        cache: Arc<ActivityCache>,
        github: Arc<dyn ContributionFeed>,
        leetcode: Arc<dyn ContributionFeed>,
        productivity: Arc<ProductivityService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let github = RemoteBranch {
            feed: github,
            identity: config.github_username.clone(),
            transform: transform_github,
        };
        let leetcode = RemoteBranch {
            feed: leetcode,
            identity: config.leetcode_username.clone(),
            transform: transform_leetcode,
        };

        Self {
            config,
            cache,
            github,
            leetcode,
            productivity,
            clock,
        }
    }

    /// Wire the real GitHub and LeetCode clients from configuration.
    pub fn from_config(
        config: HeatmapConfig,
        db: DbPool,
        cache: Arc<ActivityCache>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let github: Arc<dyn ContributionFeed> = Arc::new(GitHubClient::from_config(&config)?);
        let leetcode: Arc<dyn ContributionFeed> = Arc::new(LeetCodeClient::from_config(&config)?);
        let productivity = Arc::new(ProductivityService::new(db));
        Ok(Self::new(config, cache, github, leetcode, productivity, clock))
    }

    pub fn config_status(&self) -> HeatmapConfigStatus {
        self.config.status()
    }

    pub fn today(&self) -> DateKey {
        self.config.zone.today(self.clock.now())
    }

    /// Drop every cached upstream payload, fresh and fallback alike.
    pub fn clear_cache(&self) -> usize {
        let cleared = self.cache.clear();
        info!(target: "app::heatmap", cleared, "response cache cleared");
        cleared
    }

    pub async fn dashboard(&self) -> AppResult<DashboardResponse> {
        let today = self.today();

        if !self.config.enabled() {
            debug!(target: "app::heatmap", "no identities configured; returning empty dashboard");
            return Ok(self.empty_dashboard());
        }

        let (github, leetcode, (productivity, metrics)) = tokio::join!(
            self.remote_outcome(&self.github),
            self.remote_outcome(&self.leetcode),
            self.productivity_outcome(today),
        );
        let outcomes = [github, leetcode, productivity];

        let attempted: Vec<&BranchOutcome> = outcomes
            .iter()
            .filter(|outcome| outcome.status.was_attempted())
            .collect();
        if !attempted.is_empty() && attempted.iter().all(|outcome| !outcome.status.has_data()) {
            let failures = attempted
                .iter()
                .filter_map(|outcome| outcome.error_message())
                .collect();
            return Err(AppError::all_sources_failed(failures));
        }

        let [github, leetcode, productivity] = outcomes;
        let combined_data = combine(
            &github.points,
            &leetcode.points,
            &productivity.points,
            &self.config.zone,
        );

        let all_points: Vec<ActivityPoint> = github
            .points
            .iter()
            .chain(leetcode.points.iter())
            .chain(productivity.points.iter())
            .cloned()
            .collect();
        let mut stats = streak_calculator::calculate(&all_points, today, &self.config.zone);
        stats.productivity_rate = metrics.productivity_rate;
        stats.schedule_adherence = metrics.schedule_adherence;

        let reports = [&github, &leetcode, &productivity];
        let stale = reports
            .iter()
            .any(|outcome| outcome.status == SourceStatus::Stale);
        let problems: Vec<String> = reports
            .iter()
            .filter_map(|outcome| outcome.error_message())
            .collect();

        info!(
            target: "app::heatmap",
            %today,
            days = combined_data.len(),
            github = ?github.status,
            leetcode = ?leetcode.status,
            productivity = ?productivity.status,
            stale,
            "dashboard assembled"
        );

        Ok(DashboardResponse {
            combined_data,
            stats,
            productivity: metrics,
            sources: reports.iter().map(|outcome| outcome.report()).collect(),
            stale,
            error: (!problems.is_empty()).then(|| problems.join("; ")),
            generated_at: self.clock.now().to_rfc3339(),
        })
    }

    /// Dashboard data expanded to one cell per day of the 12-month window.
    pub async fn calendar(&self) -> AppResult<CalendarResponse> {
        let today = self.today();
        let dashboard = self.dashboard().await?;
        let range = heatmap_date_range(today);
        let start = range.first().copied().unwrap_or(today);

        Ok(CalendarResponse {
            start,
            end: today,
            days: fill_missing_dates(&dashboard.combined_data, &range),
            stats: dashboard.stats,
            sources: dashboard.sources,
            stale: dashboard.stale,
        })
    }

    fn empty_dashboard(&self) -> DashboardResponse {
        DashboardResponse {
            combined_data: Vec::new(),
            stats: HeatmapStats::default(),
            productivity: ProductivityMetrics::default(),
            sources: [
                ActivitySource::GitHub,
                ActivitySource::LeetCode,
                ActivitySource::Productivity,
            ]
            .into_iter()
            .map(|source| BranchOutcome::skipped(source).report())
            .collect(),
            stale: false,
            error: None,
            generated_at: self.clock.now().to_rfc3339(),
        }
    }

    async fn remote_outcome(&self, branch: &RemoteBranch) -> BranchOutcome {
        let source = branch.feed.source();
        let Some(identity) = branch.identity.as_deref() else {
            return BranchOutcome::skipped(source);
        };

        if source == ActivitySource::GitHub && self.config.github_token.is_none() {
            return BranchOutcome {
                source,
                status: SourceStatus::Failed,
                points: Vec::new(),
                error: Some(AppError::configuration(
                    "GITHUB_TOKEN is required when GITHUB_USERNAME is set.",
                )),
            };
        }

        let fresh_key = ResponseCacheKey::fresh(source, identity);
        if let Some(points) = self.cache.get(&fresh_key.cache_key()) {
            debug!(
                target: "app::heatmap",
                source = source.as_str(),
                identity = %mask_identity(identity),
                "serving cached points"
            );
            return BranchOutcome {
                source,
                status: SourceStatus::Cached,
                points,
                error: None,
            };
        }

        match self.fetch_points(branch, identity).await {
            Ok(points) => {
                let fallback_key = ResponseCacheKey::fallback(source, identity);
                self.cache
                    .set(fresh_key.cache_key(), points.clone(), fresh_key.ttl());
                self.cache
                    .set(fallback_key.cache_key(), points.clone(), fallback_key.ttl());
                BranchOutcome {
                    source,
                    status: SourceStatus::Fresh,
                    points,
                    error: None,
                }
            }
            Err(error) if error.allows_cache_fallback() => {
                let fallback_key = ResponseCacheKey::fallback(source, identity);
                match self.cache.get(&fallback_key.cache_key()) {
                    Some(points) => {
                        warn!(
                            target: "app::heatmap",
                            source = source.as_str(),
                            error = %error,
                            "upstream failed; serving stale cached points"
                        );
                        BranchOutcome {
                            source,
                            status: SourceStatus::Stale,
                            points,
                            error: Some(error),
                        }
                    }
                    None => Self::failed(source, error),
                }
            }
            Err(error) => Self::failed(source, error),
        }
    }

    async fn fetch_points(
        &self,
        branch: &RemoteBranch,
        identity: &str,
    ) -> AppResult<Vec<ActivityPoint>> {
        let source = branch.feed.source();
        let deadline = self.config.http_timeout + BRANCH_TIMEOUT_GRACE;
        let payload = tokio::time::timeout(deadline, branch.feed.fetch(identity))
            .await
            .map_err(|_| AppError::timeout(source))??;
        let points = (branch.transform)(&payload, &self.config.zone)?;
        debug!(
            target: "app::heatmap",
            source = source.as_str(),
            points = points.len(),
            "transformed upstream payload"
        );
        Ok(points)
    }

    async fn productivity_outcome(&self, today: DateKey) -> (BranchOutcome, ProductivityMetrics) {
        let source = ActivitySource::Productivity;
        let service = Arc::clone(&self.productivity);
        let joined = task::spawn_blocking(move || service.snapshot(today))
            .await
            .map_err(|err| AppError::other(format!("productivity task failed: {err}")));

        match joined.and_then(|result| result) {
            Ok(snapshot) => (
                BranchOutcome {
                    source,
                    status: SourceStatus::Fresh,
                    points: snapshot.points,
                    error: None,
                },
                calculate_metrics(&snapshot.records),
            ),
            Err(error) => (Self::failed(source, error), ProductivityMetrics::default()),
        }
    }

    fn failed(source: ActivitySource, error: AppError) -> BranchOutcome {
        warn!(
            target: "app::heatmap",
            source = source.as_str(),
            error = %error,
            "activity source failed"
        );
        BranchOutcome {
            source,
            status: SourceStatus::Failed,
            points: Vec::new(),
            error: Some(error),
        }
    }
}
