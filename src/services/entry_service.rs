use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info};

use crate::db::repositories::entry_repository::EntryRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::entry::{
    EntryDates, EntryOverview, EntryRecord, EntryStatus, EntryUpsertInput, JournalStreak,
};
use crate::models::heatmap::{HealthState, HealthStatus};
use crate::services::journal_streak::calculate_journal_streak;
use crate::utils::clock::Clock;
use crate::utils::dates::{normalize, CalendarZone, DateKey};

const MAX_REFLECTION_CHARS: usize = 20_000;
const MAX_IMAGE_URL_CHARS: usize = 2_048;
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Journal entries keyed by calendar day.
#[derive(Clone)]
pub struct EntryService {
    db: DbPool,
    zone: CalendarZone,
    clock: Arc<dyn Clock>,
}

impl EntryService {
    pub fn new(db: DbPool, zone: CalendarZone, clock: Arc<dyn Clock>) -> Self {
        Self { db, zone, clock }
    }

    pub fn today(&self) -> DateKey {
        self.zone.today(self.clock.now())
    }

    pub fn get_entry(&self, raw_date: &str) -> AppResult<EntryRecord> {
        let date = self.parse_date(raw_date)?;
        let entry = self
            .db
            .with_connection(|conn| EntryRepository::find_by_date(conn, &date))?
            .ok_or_else(AppError::not_found)?;
        debug!(target: "app::entries", %date, "entry fetched");
        Ok(entry)
    }

    /// Create or update the entry for `input.date`. Entries for past days may be edited
    /// but not created.
    pub fn upsert_entry(&self, input: EntryUpsertInput) -> AppResult<EntryRecord> {
        let date = self.parse_date(&input.date)?;
        validate_fields(&input)?;

        let today = self.today();
        let now = self.clock.now().to_rfc3339();
        let entry = self.db.with_connection(|conn| {
            if date < today && EntryRepository::find_by_date(conn, &date)?.is_none() {
                return Err(AppError::forbidden("Cannot create new entries for past dates"));
            }
            EntryRepository::upsert(conn, &date, &input, &now)
        })?;
        info!(
            target: "app::entries",
            %date,
            flame_day = entry.is_flame_day(),
            "entry saved"
        );
        Ok(entry)
    }

    pub fn delete_entry(&self, raw_date: &str) -> AppResult<()> {
        let date = self.parse_date(raw_date)?;
        let deleted = self
            .db
            .with_connection(|conn| EntryRepository::delete(conn, &date))?;
        if !deleted {
            return Err(AppError::not_found());
        }
        info!(target: "app::entries", %date, "entry deleted");
        Ok(())
    }

    /// Newest entries first, each with its day number and completion flags.
    pub fn list_entries(&self, limit: usize) -> AppResult<Vec<EntryOverview>> {
        let limit = limit.clamp(1, DEFAULT_LIST_LIMIT);
        self.db.with_connection(|conn| {
            EntryRepository::list_recent(conn, limit)?
                .into_iter()
                .map(|entry| -> AppResult<EntryOverview> {
                    let day_x = EntryRepository::day_number(conn, &entry.date)?;
                    Ok(EntryOverview::new(entry, day_x))
                })
                .collect()
        })
    }

    pub fn status(&self) -> AppResult<EntryStatus> {
        let today = self.today();
        self.db
            .with_connection(|conn| EntryRepository::status(conn, &today))
    }

    pub fn dates(&self) -> AppResult<EntryDates> {
        let dates = self.db.with_connection(EntryRepository::list_dates)?;
        Ok(EntryDates { dates })
    }

    /// Flame-day streak as of `today`. Never fails: store errors degrade to a zero streak.
    pub fn journal_streak(&self, today: DateKey) -> JournalStreak {
        match self
            .db
            .with_connection(|conn| EntryRepository::list_up_to(conn, &today))
        {
            Ok(entries) => {
                let result = calculate_journal_streak(&entries, today);
                debug!(
                    target: "app::entries",
                    %today,
                    streak = result.streak,
                    flame_days = result.flame_dates.len(),
                    "journal streak computed"
                );
                result
            }
            Err(err) => {
                error!(
                    target: "app::entries",
                    error = %err,
                    "journal streak unavailable; reporting zero"
                );
                JournalStreak::default()
            }
        }
    }

    /// Healthy when the store is reachable and holds at least one entry.
    pub fn health(&self) -> HealthStatus {
        match self.db.with_connection(EntryRepository::count) {
            Ok(total) if total > 0 => HealthStatus {
                status: HealthState::Healthy,
                error: None,
            },
            Ok(_) => HealthStatus {
                status: HealthState::Unhealthy,
                error: None,
            },
            Err(err) => {
                error!(target: "app::entries", error = %err, "health check failed");
                HealthStatus {
                    status: HealthState::Unhealthy,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn parse_date(&self, raw: &str) -> AppResult<DateKey> {
        normalize(raw, &self.zone).ok_or_else(|| {
            AppError::validation_with_details("invalid entry date", json!({ "date": raw }))
        })
    }
}

fn validate_fields(input: &EntryUpsertInput) -> AppResult<()> {
    if let Some(text) = input.reflection_text.as_deref() {
        if text.chars().count() > MAX_REFLECTION_CHARS {
            return Err(AppError::validation(format!(
                "reflection text exceeds {MAX_REFLECTION_CHARS} characters"
            )));
        }
    }

    for (field, value) in [
        (
            "expectedScheduleImageUrl",
            input.expected_schedule_image_url.as_deref(),
        ),
        (
            "actualScheduleImageUrl",
            input.actual_schedule_image_url.as_deref(),
        ),
    ] {
        if value.is_some_and(|url| url.len() > MAX_IMAGE_URL_CHARS) {
            return Err(AppError::validation_with_details(
                "image URL is too long",
                json!({ "field": field, "max": MAX_IMAGE_URL_CHARS }),
            ));
        }
    }

    Ok(())
}
