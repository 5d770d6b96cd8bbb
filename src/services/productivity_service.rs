use serde::Serialize;
use tracing::debug;

use crate::db::repositories::entry_repository::EntryRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::activity::ActivityPoint;
use crate::models::entry::EntryRecord;
use crate::models::productivity::{ProductivityMetrics, ProductivityRecord};
use crate::utils::dates::{window_start, DateKey};

const JOURNAL_FIELDS: f64 = 3.0;
const ACTIVITY_SCALE: f64 = 10.0;

/// Productivity records for the heatmap window, plus the activity points derived from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivitySnapshot {
    pub records: Vec<ProductivityRecord>,
    pub points: Vec<ActivityPoint>,
}

/// Local productivity signal read from the entry store.
pub struct ProductivityService {
    db: DbPool,
}

impl ProductivityService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Blocking: reads every entry between the window start and `today`.
    pub fn snapshot(&self, today: DateKey) -> AppResult<ProductivitySnapshot> {
        let start = window_start(today);
        let entries = self
            .db
            .with_connection(|conn| EntryRepository::list_between(conn, &start, &today))?;

        let records: Vec<ProductivityRecord> = entries.iter().map(productivity_record).collect();
        let points = to_activity_points(&records);
        debug!(
            target: "app::heatmap::productivity",
            %start,
            end = %today,
            days = records.len(),
            "loaded productivity records"
        );

        Ok(ProductivitySnapshot { records, points })
    }
}

fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn productivity_record(entry: &EntryRecord) -> ProductivityRecord {
    let has_reflection = is_filled(&entry.reflection_text);
    let has_expected_schedule = is_filled(&entry.expected_schedule_image_url);
    let has_actual_schedule = is_filled(&entry.actual_schedule_image_url);
    let filled = [has_reflection, has_expected_schedule, has_actual_schedule]
        .iter()
        .filter(|flag| **flag)
        .count();

    ProductivityRecord {
        date: entry.date,
        has_reflection,
        has_expected_schedule,
        has_actual_schedule,
        completion_score: filled as f64 / JOURNAL_FIELDS,
    }
}

/// Completion score scaled to a 0..=10 daily count.
pub fn to_activity_points(records: &[ProductivityRecord]) -> Vec<ActivityPoint> {
    records
        .iter()
        .map(|record| {
            ActivityPoint::new(
                record.date.to_string(),
                (record.completion_score * ACTIVITY_SCALE).round() as u64,
            )
        })
        .collect()
}

pub fn calculate_metrics(records: &[ProductivityRecord]) -> ProductivityMetrics {
    if records.is_empty() {
        return ProductivityMetrics::default();
    }

    let total = records.len() as f64;
    let with_reflection = records.iter().filter(|r| r.has_reflection).count();
    let with_both_schedules = records
        .iter()
        .filter(|r| r.has_expected_schedule && r.has_actual_schedule)
        .count();
    let with_any = records
        .iter()
        .filter(|r| r.has_reflection || r.has_expected_schedule || r.has_actual_schedule)
        .count();

    ProductivityMetrics {
        productivity_rate: with_any as f64 / total * 100.0,
        schedule_adherence: with_both_schedules as f64 / total * 100.0,
        reflection_rate: with_reflection as f64 / total * 100.0,
        total_productive_days: with_any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, reflection: &str, expected: &str, actual: &str) -> EntryRecord {
        EntryRecord {
            date: DateKey::parse(date).expect("valid key"),
            reflection_text: reflection.to_string(),
            expected_schedule_image_url: expected.to_string(),
            actual_schedule_image_url: actual.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn completion_score_counts_trimmed_fields() {
        let record = productivity_record(&entry("2024-06-01", "  notes ", "   ", "/a.png"));
        assert!(record.has_reflection);
        assert!(!record.has_expected_schedule);
        assert!((record.completion_score - 2.0 / 3.0).abs() < 1e-9);

        let points = to_activity_points(&[record]);
        assert_eq!(points, vec![ActivityPoint::new("2024-06-01", 7)]);
    }

    #[test]
    fn full_and_empty_entries_map_to_ten_and_zero() {
        let records = [
            productivity_record(&entry("2024-06-01", "r", "/e.png", "/a.png")),
            productivity_record(&entry("2024-06-02", "", "", "")),
        ];
        let points = to_activity_points(&records);
        assert_eq!(points[0].count, 10);
        assert_eq!(points[1].count, 0);
    }

    #[test]
    fn metrics_are_percentages_of_entry_days() {
        let records: Vec<ProductivityRecord> = [
            entry("2024-06-01", "r", "/e.png", "/a.png"),
            entry("2024-06-02", "r", "", ""),
            entry("2024-06-03", "", "/e.png", ""),
            entry("2024-06-04", "", "", ""),
        ]
        .iter()
        .map(productivity_record)
        .collect();

        let metrics = calculate_metrics(&records);
        assert!((metrics.productivity_rate - 75.0).abs() < 1e-9);
        assert!((metrics.schedule_adherence - 25.0).abs() < 1e-9);
        assert!((metrics.reflection_rate - 50.0).abs() < 1e-9);
        assert_eq!(metrics.total_productive_days, 3);
    }

    #[test]
    fn no_records_means_zero_metrics() {
        assert_eq!(calculate_metrics(&[]), ProductivityMetrics::default());
    }
}
