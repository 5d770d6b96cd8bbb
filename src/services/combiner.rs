use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use crate::models::activity::{ActivityPoint, ActivitySource, CombinedActivityPoint};
use crate::utils::dates::{date_range, normalize, window_start, CalendarZone, DateKey};

/// Sum a source's points into a per-day running total, skipping unparseable dates.
pub(crate) fn accumulate(
    stream: &str,
    points: &[ActivityPoint],
    zone: &CalendarZone,
) -> BTreeMap<DateKey, u64> {
    let mut totals = BTreeMap::new();
    for point in points {
        match normalize(point.date.as_str(), zone) {
            Some(date) => {
                let total = totals.entry(date).or_insert(0_u64);
                *total = total.saturating_add(point.count);
            }
            None => warn!(
                target: "app::heatmap::combine",
                stream,
                raw_date = %point.date,
                "skipping activity point with invalid date"
            ),
        }
    }
    totals
}

/// Merge the three source streams into one record per day, ascending by date.
///
/// The output covers the union of all dates seen; a day missing from a source
/// contributes zero for that source.
pub fn combine(
    github: &[ActivityPoint],
    leetcode: &[ActivityPoint],
    productivity: &[ActivityPoint],
    zone: &CalendarZone,
) -> Vec<CombinedActivityPoint> {
    let github = accumulate(ActivitySource::GitHub.as_str(), github, zone);
    let leetcode = accumulate(ActivitySource::LeetCode.as_str(), leetcode, zone);
    let productivity = accumulate(ActivitySource::Productivity.as_str(), productivity, zone);

    let dates: BTreeSet<DateKey> = github
        .keys()
        .chain(leetcode.keys())
        .chain(productivity.keys())
        .copied()
        .collect();

    dates
        .into_iter()
        .map(|date| {
            CombinedActivityPoint::new(
                date,
                github.get(&date).copied().unwrap_or(0),
                leetcode.get(&date).copied().unwrap_or(0),
                productivity.get(&date).copied().unwrap_or(0),
            )
        })
        .collect()
}

/// Every day of the rolling heatmap window: the first of the month eleven months back
/// through `today`.
pub fn heatmap_date_range(today: DateKey) -> Vec<DateKey> {
    date_range(window_start(today), today)
}

/// Expand `combined` to one point per day of `range`, inserting zero points for gaps.
/// Days outside the range are dropped.
pub fn fill_missing_dates(
    combined: &[CombinedActivityPoint],
    range: &[DateKey],
) -> Vec<CombinedActivityPoint> {
    let by_date: HashMap<DateKey, &CombinedActivityPoint> =
        combined.iter().map(|point| (point.date, point)).collect();

    range
        .iter()
        .map(|date| {
            by_date
                .get(date)
                .map(|point| (*point).clone())
                .unwrap_or_else(|| CombinedActivityPoint::empty(*date))
        })
        .collect()
}
