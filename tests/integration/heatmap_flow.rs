use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use httpmock::prelude::*;
use planner_heatmap_lib::commands::cache::cache_clear_all;
use planner_heatmap_lib::commands::entries::entries_upsert;
use planner_heatmap_lib::commands::heatmap::{
    heatmap_calendar_fetch, heatmap_config_get, heatmap_dashboard_fetch,
};
use planner_heatmap_lib::commands::AppState;
use planner_heatmap_lib::db::DbPool;
use planner_heatmap_lib::models::activity::ActivitySource;
use planner_heatmap_lib::models::entry::EntryUpsertInput;
use planner_heatmap_lib::models::heatmap::{DashboardResponse, SourceStatus};
use planner_heatmap_lib::models::settings::HeatmapConfig;
use planner_heatmap_lib::utils::clock::{Clock, ManualClock};
use planner_heatmap_lib::utils::dates::{CalendarZone, DateKey};
use serde_json::{json, Value as JsonValue};
use tempfile::{tempdir, TempDir};

fn github_body() -> JsonValue {
    json!({
        "data": { "user": { "contributionsCollection": { "contributionCalendar": {
            "totalContributions": 5,
            "weeks": [{ "contributionDays": [
                { "date": "2024-01-01", "contributionCount": 3 },
                { "date": "2024-01-02", "contributionCount": 0 },
                { "date": "2024-01-03", "contributionCount": 2 }
            ]}]
        }}}}
    })
}

fn leetcode_body() -> JsonValue {
    // 1704153600 = 2024-01-02T00:00:00Z
    json!({ "data": { "matchedUser": { "submissionCalendar": "{\"1704153600\": 1}" } } })
}

struct Flow {
    state: AppState,
    clock: ManualClock,
    db_path: std::path::PathBuf,
    _dir: TempDir,
}

fn flow(server: &MockServer, configure: impl FnOnce(&mut HeatmapConfig)) -> Flow {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("planner.sqlite");
    let pool = DbPool::new(&db_path).expect("db pool");
    let clock = ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0)
            .single()
            .expect("instant"),
    );

    let mut config = HeatmapConfig {
        github_username: Some("octocat".into()),
        leetcode_username: Some("solver".into()),
        github_token: Some("ghp_flow".into()),
        github_api_url: server.url("/github"),
        leetcode_api_url: server.url("/leetcode"),
        http_timeout: StdDuration::from_secs(2),
        zone: CalendarZone::Named(chrono_tz::UTC),
        db_path: db_path.clone(),
        log_dir: dir.path().join("logs"),
    };
    configure(&mut config);

    let clock_handle: Arc<dyn Clock> = Arc::new(clock.clone());
    let state = AppState::new(config, pool, clock_handle).expect("app state");

    Flow {
        state,
        clock,
        db_path,
        _dir: dir,
    }
}

fn status_of(response: &DashboardResponse, source: ActivitySource) -> SourceStatus {
    response
        .sources
        .iter()
        .find(|report| report.source == source)
        .map(|report| report.status)
        .expect("source reported")
}

fn key(value: &str) -> DateKey {
    DateKey::parse(value).expect("valid key")
}

#[tokio::test]
async fn dashboard_merges_remote_and_journal_activity() {
    let server = MockServer::start_async().await;
    let github = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/github")
                .header("authorization", "Bearer ghp_flow");
            then.status(200).json_body(github_body());
        })
        .await;
    let leetcode = server
        .mock_async(|when, then| {
            when.method(POST).path("/leetcode");
            then.status(200).json_body(leetcode_body());
        })
        .await;

    let flow = flow(&server, |_| {});
    entries_upsert(
        &flow.state,
        EntryUpsertInput {
            date: "2024-01-03".into(),
            reflection_text: Some("shipped the heatmap".into()),
            expected_schedule_image_url: Some("/uploads/plan.png".into()),
            actual_schedule_image_url: Some("/uploads/actual.png".into()),
        },
    )
    .await
    .expect("seed entry");

    let dashboard = heatmap_dashboard_fetch(&flow.state).await.expect("dashboard");

    let totals: Vec<(DateKey, u64)> = dashboard
        .combined_data
        .iter()
        .map(|point| (point.date, point.total_activity))
        .collect();
    assert_eq!(
        totals,
        vec![
            (key("2024-01-01"), 3),
            (key("2024-01-02"), 1),
            (key("2024-01-03"), 12),
        ]
    );
    assert_eq!(dashboard.stats.current_streak, 3);
    assert_eq!(dashboard.stats.longest_streak, 3);
    assert_eq!(dashboard.stats.total_contributions, 16);
    assert_eq!(dashboard.stats.best_day.date, Some(key("2024-01-03")));
    assert!((dashboard.stats.productivity_rate - 100.0).abs() < 1e-9);
    assert!(!dashboard.stale);
    assert_eq!(status_of(&dashboard, ActivitySource::Productivity), SourceStatus::Fresh);

    // Within both TTLs: answered from cache without touching upstream.
    flow.clock.advance(Duration::minutes(20));
    let cached = heatmap_dashboard_fetch(&flow.state).await.expect("cached");
    assert_eq!(status_of(&cached, ActivitySource::GitHub), SourceStatus::Cached);
    assert_eq!(status_of(&cached, ActivitySource::LeetCode), SourceStatus::Cached);
    assert_eq!(github.hits_async().await, 1);
    assert_eq!(leetcode.hits_async().await, 1);

    let calendar = heatmap_calendar_fetch(&flow.state).await.expect("calendar");
    assert_eq!(calendar.start, key("2023-02-01"));
    assert_eq!(calendar.end, key("2024-01-03"));
    assert_eq!(calendar.days.len(), 337);
    assert!(calendar.days.windows(2).all(|pair| pair[0].date < pair[1].date));

    let cleared = cache_clear_all(&flow.state).await.expect("clear");
    assert_eq!(cleared.entries_cleared, 4);
    heatmap_dashboard_fetch(&flow.state).await.expect("refetch");
    assert_eq!(github.hits_async().await, 2);
}

#[tokio::test]
async fn upstream_outage_serves_stale_copies() {
    let server = MockServer::start_async().await;
    let mut github_ok = server
        .mock_async(|when, then| {
            when.method(POST).path("/github");
            then.status(200).json_body(github_body());
        })
        .await;
    let mut leetcode_ok = server
        .mock_async(|when, then| {
            when.method(POST).path("/leetcode");
            then.status(200).json_body(leetcode_body());
        })
        .await;

    let flow = flow(&server, |_| {});
    heatmap_dashboard_fetch(&flow.state).await.expect("warm cache");

    github_ok.delete_async().await;
    leetcode_ok.delete_async().await;
    let _github_down = server
        .mock_async(|when, then| {
            when.method(POST).path("/github");
            then.status(502);
        })
        .await;
    let _leetcode_missing = server
        .mock_async(|when, then| {
            when.method(POST).path("/leetcode");
            then.status(404);
        })
        .await;

    // Past both fresh TTLs, inside the fallback window.
    flow.clock.advance(Duration::hours(3));
    let dashboard = heatmap_dashboard_fetch(&flow.state).await.expect("stale dashboard");

    assert!(dashboard.stale);
    assert_eq!(status_of(&dashboard, ActivitySource::GitHub), SourceStatus::Stale);
    assert_eq!(status_of(&dashboard, ActivitySource::LeetCode), SourceStatus::Stale);
    assert_eq!(dashboard.combined_data.len(), 3);
    let summary = dashboard.error.expect("failures summarized");
    assert!(summary.contains("GitHub: Failed to fetch GitHub data (status 502)"));
    assert!(summary.contains("LeetCode: user not found"));
}

#[tokio::test]
async fn every_source_failing_is_an_error() {
    let server = MockServer::start_async().await;
    let _github = server
        .mock_async(|when, then| {
            when.method(POST).path("/github");
            then.status(500);
        })
        .await;
    let _leetcode = server
        .mock_async(|when, then| {
            when.method(POST).path("/leetcode");
            then.status(429);
        })
        .await;

    let flow = flow(&server, |_| {});
    // A directory where the database file should be makes the journal unreadable.
    std::fs::remove_file(&flow.db_path).expect("remove db");
    let _ = std::fs::remove_file(flow.db_path.with_extension("sqlite-wal"));
    let _ = std::fs::remove_file(flow.db_path.with_extension("sqlite-shm"));
    std::fs::create_dir(&flow.db_path).expect("dir in place of db");

    let error = heatmap_dashboard_fetch(&flow.state)
        .await
        .expect_err("nothing to show");

    assert_eq!(error.code, "ALL_SOURCES_FAILED");
    let failures = error
        .details
        .as_ref()
        .and_then(|details| details["failures"].as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(failures.len(), 3);
    assert!(failures
        .iter()
        .any(|failure| failure == "LeetCode: Too many requests, please try again later"));
}

#[tokio::test]
async fn github_without_token_is_skipped_with_a_configuration_error() {
    let server = MockServer::start_async().await;
    let github = server
        .mock_async(|when, then| {
            when.method(POST).path("/github");
            then.status(200).json_body(github_body());
        })
        .await;
    let _leetcode = server
        .mock_async(|when, then| {
            when.method(POST).path("/leetcode");
            then.status(200).json_body(leetcode_body());
        })
        .await;

    let flow = flow(&server, |config| config.github_token = None);

    let status = heatmap_config_get(&flow.state).await.expect("config status");
    assert!(!status.valid);
    assert!(status
        .errors
        .iter()
        .any(|message| message.contains("GITHUB_TOKEN")));

    let dashboard = heatmap_dashboard_fetch(&flow.state).await.expect("partial");
    assert_eq!(github.hits_async().await, 0);
    assert_eq!(status_of(&dashboard, ActivitySource::GitHub), SourceStatus::Failed);
    assert_eq!(status_of(&dashboard, ActivitySource::LeetCode), SourceStatus::Fresh);
    assert_eq!(dashboard.combined_data.len(), 1);
    assert_eq!(dashboard.combined_data[0].leetcode_count, 1);
}

#[tokio::test]
async fn unconfigured_heatmap_returns_an_empty_dashboard() {
    let server = MockServer::start_async().await;
    let flow = flow(&server, |config| {
        config.github_username = None;
        config.leetcode_username = None;
        config.github_token = None;
    });

    let status = heatmap_config_get(&flow.state).await.expect("config status");
    assert!(!status.enabled);

    let dashboard = heatmap_dashboard_fetch(&flow.state).await.expect("empty");
    assert!(dashboard.combined_data.is_empty());
    assert_eq!(dashboard.stats.total_contributions, 0);
    assert_eq!(dashboard.stats.best_day.date, None);
    assert!(dashboard
        .sources
        .iter()
        .all(|report| report.status == SourceStatus::Skipped));
}
