use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use planner_heatmap_lib::commands::entries::{
    entries_dates_fetch, entries_delete, entries_get, entries_list, entries_status_fetch,
    entries_streak_fetch, entries_upsert, EntryListQuery,
};
use planner_heatmap_lib::commands::health::health_check;
use planner_heatmap_lib::commands::AppState;
use planner_heatmap_lib::db::DbPool;
use planner_heatmap_lib::models::entry::EntryUpsertInput;
use planner_heatmap_lib::models::heatmap::HealthState;
use planner_heatmap_lib::models::settings::HeatmapConfig;
use planner_heatmap_lib::utils::clock::{Clock, ManualClock};
use planner_heatmap_lib::utils::dates::{CalendarZone, DateKey};
use tempfile::{tempdir, TempDir};

fn journal(zone: CalendarZone, now: chrono::DateTime<Utc>) -> (AppState, ManualClock, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("journal.sqlite")).expect("db pool");
    let clock = ManualClock::new(now);
    let config = HeatmapConfig {
        zone,
        ..HeatmapConfig::default()
    };
    let handle: Arc<dyn Clock> = Arc::new(clock.clone());
    let state = AppState::new(config, pool, handle).expect("app state");
    (state, clock, dir)
}

fn entry(date: &str, reflection: &str, expected: &str, actual: &str) -> EntryUpsertInput {
    EntryUpsertInput {
        date: date.into(),
        reflection_text: Some(reflection.into()),
        expected_schedule_image_url: Some(expected.into()),
        actual_schedule_image_url: Some(actual.into()),
    }
}

fn key(value: &str) -> DateKey {
    DateKey::parse(value).expect("valid key")
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("instant")
}

/// Journal opened on the morning of June 1, before any entry exists.
fn first_morning(zone: CalendarZone) -> (AppState, ManualClock, TempDir) {
    journal(zone, at(2024, 6, 1, 12))
}

async fn seed_first_week(state: &AppState) {
    for input in [
        entry("2024-06-01", "planned the week", "/uploads/e1.png", ""),
        entry("2024-06-02", "reviewed goals", "", "/uploads/a2.png"),
        entry("2024-06-03", "", "/uploads/e3.png", "/uploads/a3.png"),
    ] {
        entries_upsert(state, input).await.expect("seed entry");
    }
}

#[tokio::test]
async fn streak_runs_through_yesterday_and_breaks_after_a_gap() {
    let (state, clock, _dir) = first_morning(CalendarZone::Named(chrono_tz::UTC));
    seed_first_week(&state).await;
    clock.set(at(2024, 6, 3, 18));

    let streak = entries_streak_fetch(&state).await.expect("streak");
    assert_eq!(streak.streak, 2);
    assert_eq!(streak.flame_dates, vec![key("2024-06-01"), key("2024-06-02")]);

    // June 3 has no reflection, so on June 4 yesterday is not a flame day.
    clock.advance(Duration::days(1));
    let streak = entries_streak_fetch(&state).await.expect("streak");
    assert_eq!(streak.streak, 0);

    entries_upsert(
        &state,
        EntryUpsertInput {
            date: "2024-06-03".into(),
            reflection_text: Some("caught up".into()),
            ..EntryUpsertInput::default()
        },
    )
    .await
    .expect("fill reflection");
    let streak = entries_streak_fetch(&state).await.expect("streak");
    assert_eq!(streak.streak, 3);
}

#[tokio::test]
async fn today_follows_the_configured_timezone() {
    // 05:00 UTC on June 3 is still June 2 in Los Angeles.
    let zone = CalendarZone::from_name("America/Los_Angeles").expect("zone");
    let (state, clock, _dir) = first_morning(zone);
    seed_first_week(&state).await;
    clock.set(at(2024, 6, 3, 5));
    entries_upsert(&state, entry("2024-06-04", "future", "/e.png", ""))
        .await
        .expect("future entry");

    let streak = entries_streak_fetch(&state).await.expect("streak");
    assert_eq!(streak.streak, 2);
    assert!(!streak.flame_dates.contains(&key("2024-06-04")));
}

#[tokio::test]
async fn entry_commands_report_errors_and_health() {
    let (state, clock, _dir) = first_morning(CalendarZone::Named(chrono_tz::UTC));

    let health = health_check(&state).await.expect("health");
    assert_eq!(health.status, HealthState::Unhealthy);

    let invalid = entries_upsert(&state, entry("someday", "x", "", ""))
        .await
        .expect_err("bad date");
    assert_eq!(invalid.code, "VALIDATION_ERROR");

    seed_first_week(&state).await;
    clock.set(at(2024, 6, 3, 12));
    let health = health_check(&state).await.expect("health");
    assert_eq!(health.status, HealthState::Healthy);

    let fetched = entries_get(&state, "2024-06-02".into()).await.expect("get");
    assert_eq!(fetched.reflection_text, "reviewed goals");

    let listed = entries_list(&state, Some(EntryListQuery { limit: Some(2) }))
        .await
        .expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].entry.date, key("2024-06-03"));
    assert_eq!(listed[0].day_x, 3);
    assert!(!listed[0].has_reflection);

    entries_delete(&state, "2024-06-02".into())
        .await
        .expect("delete");
    let missing = entries_get(&state, "2024-06-02".into())
        .await
        .expect_err("deleted");
    assert_eq!(missing.code, "NOT_FOUND");

    let streak = entries_streak_fetch(&state).await.expect("streak");
    assert_eq!(streak.streak, 0);
    assert_eq!(streak.flame_dates, vec![key("2024-06-01")]);
}

#[tokio::test]
async fn past_days_without_an_entry_cannot_be_backfilled() {
    let (state, clock, _dir) = first_morning(CalendarZone::Named(chrono_tz::UTC));
    entries_upsert(&state, entry("2024-06-01", "day one", "", ""))
        .await
        .expect("entry for today");

    clock.set(at(2024, 6, 4, 9));
    let refused = entries_upsert(&state, entry("2024-06-02", "forgot", "", ""))
        .await
        .expect_err("past day without an entry");
    assert_eq!(refused.code, "FORBIDDEN");
    assert_eq!(refused.message, "Cannot create new entries for past dates");

    let edited = entries_upsert(&state, entry("2024-06-01", "day one, revised", "", ""))
        .await
        .expect("existing past entry stays editable");
    assert_eq!(edited.reflection_text, "day one, revised");

    entries_upsert(&state, entry("2024-06-04", "today", "", ""))
        .await
        .expect("entry for today");
}

#[tokio::test]
async fn status_and_dates_describe_the_journal() {
    let (state, clock, _dir) = first_morning(CalendarZone::Named(chrono_tz::UTC));

    let empty = entries_status_fetch(&state).await.expect("status");
    assert_eq!(empty.total, 0);
    assert!(!empty.has_today_entry);
    assert!(entries_dates_fetch(&state)
        .await
        .expect("dates")
        .dates
        .is_empty());

    seed_first_week(&state).await;
    clock.set(at(2024, 6, 3, 12));

    let status = entries_status_fetch(&state).await.expect("status");
    assert_eq!(status.total, 3);
    assert_eq!(status.with_reflection, 2);
    assert_eq!(status.with_expected_schedule, 2);
    assert_eq!(status.with_actual_schedule, 2);
    assert!(status.has_today_entry);

    let dates = entries_dates_fetch(&state).await.expect("dates");
    assert_eq!(
        dates.dates,
        vec![key("2024-06-01"), key("2024-06-02"), key("2024-06-03")]
    );

    clock.advance(Duration::days(1));
    let status = entries_status_fetch(&state).await.expect("status");
    assert!(!status.has_today_entry);
}
