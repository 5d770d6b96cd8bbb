use std::collections::BTreeMap;

use crate::models::activity::{ActivityPoint, BestDay, HeatmapStats};
use crate::services::combiner::accumulate;
use crate::utils::dates::{window_start, CalendarZone, DateKey};

/// Streaks, totals and best day over the 12-month window ending at `today`.
///
/// Points from any number of sources may be passed together; same-day points are summed
/// before anything else. A day is active when its summed count is positive.
pub fn calculate(points: &[ActivityPoint], today: DateKey, zone: &CalendarZone) -> HeatmapStats {
    let start = window_start(today);
    let daily: BTreeMap<DateKey, u64> = accumulate("merged", points, zone)
        .into_iter()
        .filter(|(date, _)| *date >= start && *date <= today)
        .collect();

    if daily.is_empty() {
        return HeatmapStats::default();
    }

    let current_streak = current_streak(&daily, today, start);
    let longest_streak = longest_streak(&daily).max(current_streak);

    let mut total_contributions = 0_u64;
    let mut best_day = BestDay::default();
    for (date, count) in &daily {
        total_contributions = total_contributions.saturating_add(*count);
        if *count > best_day.count {
            best_day = BestDay {
                date: Some(*date),
                count: *count,
            };
        }
    }

    HeatmapStats {
        current_streak,
        longest_streak,
        total_contributions,
        average_per_day: total_contributions as f64 / daily.len() as f64,
        best_day,
        productivity_rate: 0.0,
        schedule_adherence: 0.0,
    }
}

fn is_active(daily: &BTreeMap<DateKey, u64>, date: &DateKey) -> bool {
    daily.get(date).is_some_and(|count| *count > 0)
}

/// Consecutive active days ending today, or ending yesterday when today is still empty.
fn current_streak(daily: &BTreeMap<DateKey, u64>, today: DateKey, start: DateKey) -> u32 {
    let anchor = if is_active(daily, &today) {
        Some(today)
    } else {
        today.previous().filter(|yesterday| is_active(daily, yesterday))
    };

    let mut streak = 0;
    let mut cursor = anchor;
    while let Some(date) = cursor {
        if date < start || !is_active(daily, &date) {
            break;
        }
        streak += 1;
        cursor = date.previous();
    }
    streak
}

fn longest_streak(daily: &BTreeMap<DateKey, u64>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut last_active: Option<DateKey> = None;

    for date in daily.iter().filter(|(_, count)| **count > 0).map(|(date, _)| *date) {
        run = match last_active {
            Some(previous) if date.days_since(&previous) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        last_active = Some(date);
    }
    longest
}
