//! Upstream payload → `ActivityPoint` conversion for the two remote sources.

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::activity::{ActivityPoint, ActivitySource};
use crate::utils::dates::{normalize, CalendarZone, DateInput};

const GITHUB_WEEKS_POINTER: &str = "/data/user/contributionsCollection/contributionCalendar/weeks";
const LEETCODE_CALENDAR_POINTER: &str = "/data/matchedUser/submissionCalendar";

/// Flatten a GitHub contribution calendar into one point per day.
pub fn transform_github(payload: &JsonValue, zone: &CalendarZone) -> AppResult<Vec<ActivityPoint>> {
    if let Some(errors) = payload.get("errors").and_then(JsonValue::as_array) {
        if let Some(first) = errors.first() {
            let message = first
                .get("message")
                .and_then(JsonValue::as_str)
                .unwrap_or("GitHub API returned an error");
            return Err(AppError::source(ActivitySource::GitHub, message));
        }
    }

    let weeks = payload
        .pointer(GITHUB_WEEKS_POINTER)
        .and_then(JsonValue::as_array)
        .ok_or_else(|| AppError::source(ActivitySource::GitHub, "Invalid GitHub data"))?;

    let mut points = Vec::with_capacity(weeks.len() * 7);
    for week in weeks {
        let Some(days) = week.get("contributionDays").and_then(JsonValue::as_array) else {
            continue;
        };

        for day in days {
            let raw_date = day.get("date").and_then(JsonValue::as_str).unwrap_or_default();
            let Some(date) = normalize(raw_date, zone) else {
                warn!(
                    target: "app::heatmap::transform",
                    source = "github",
                    raw_date,
                    "skipping contribution day with invalid date"
                );
                continue;
            };

            let count = day.get("contributionCount").map(read_count).unwrap_or(0);
            points.push(ActivityPoint::new(date.to_string(), count));
        }
    }

    Ok(points)
}

/// Convert a LeetCode submission calendar (epoch seconds → count) into daily points.
pub fn transform_leetcode(
    payload: &JsonValue,
    zone: &CalendarZone,
) -> AppResult<Vec<ActivityPoint>> {
    let calendar = match payload.pointer(LEETCODE_CALENDAR_POINTER) {
        Some(JsonValue::String(encoded)) => serde_json::from_str::<JsonValue>(encoded).map_err(|err| {
            AppError::source(
                ActivitySource::LeetCode,
                format!("Invalid LeetCode submission calendar: {err}"),
            )
        })?,
        Some(value @ JsonValue::Object(_)) => value.clone(),
        _ => {
            return Err(AppError::source(
                ActivitySource::LeetCode,
                "Invalid LeetCode data: missing matchedUser.submissionCalendar",
            ))
        }
    };

    let entries = calendar.as_object().ok_or_else(|| {
        AppError::source(
            ActivitySource::LeetCode,
            "Invalid LeetCode submission calendar: expected an object",
        )
    })?;

    let mut points = Vec::with_capacity(entries.len());
    for (timestamp, count) in entries {
        let date = timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|seconds| normalize(DateInput::EpochSeconds(seconds), zone));

        match date {
            Some(date) => points.push(ActivityPoint::new(date.to_string(), read_count(count))),
            None => warn!(
                target: "app::heatmap::transform",
                source = "leetcode",
                timestamp = %timestamp,
                "skipping submission with invalid timestamp"
            ),
        }
    }

    Ok(points)
}

/// Lenient count reader: non-negative integers, floats, and numeric strings; anything
/// else counts as zero.
fn read_count(value: &JsonValue) -> u64 {
    match value {
        JsonValue::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u64))
            .unwrap_or(0),
        JsonValue::String(text) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}
