use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::entry::{EntryRecord, EntryStatus, EntryUpsertInput};
use crate::utils::dates::DateKey;

const SELECT_COLUMNS: &str = r#"
    SELECT
        date,
        reflection_text,
        expected_schedule_image_url,
        actual_schedule_image_url,
        created_at,
        updated_at
    FROM entries
"#;

#[derive(Debug, Clone)]
pub struct EntryRow {
    pub date: String,
    pub reflection_text: String,
    pub expected_schedule_image_url: String,
    pub actual_schedule_image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl EntryRow {
    pub fn into_record(self) -> AppResult<EntryRecord> {
        let date = DateKey::parse(&self.date).ok_or_else(|| {
            AppError::database(format!("stored entry has invalid date {:?}", self.date))
        })?;

        Ok(EntryRecord {
            date,
            reflection_text: self.reflection_text,
            expected_schedule_image_url: self.expected_schedule_image_url,
            actual_schedule_image_url: self.actual_schedule_image_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for EntryRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            date: row.get("date")?,
            reflection_text: row.get("reflection_text")?,
            expected_schedule_image_url: row.get("expected_schedule_image_url")?,
            actual_schedule_image_url: row.get("actual_schedule_image_url")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct EntryRepository;

impl EntryRepository {
    pub fn find_by_date(conn: &Connection, date: &DateKey) -> AppResult<Option<EntryRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE date = :date");
        let mut stmt = conn.prepare(&sql)?;

        let row = stmt
            .query_row(named_params! {":date": date.to_string()}, |row| {
                EntryRow::try_from(row)
            })
            .optional()?;

        row.map(EntryRow::into_record).transpose()
    }

    /// Insert or partially update the entry for `date`. Fields left as `None` in `input`
    /// keep their stored value (or start empty on insert).
    pub fn upsert(
        conn: &Connection,
        date: &DateKey,
        input: &EntryUpsertInput,
        timestamp: &str,
    ) -> AppResult<EntryRecord> {
        conn.execute(
            r#"
                INSERT INTO entries (
                    date,
                    reflection_text,
                    expected_schedule_image_url,
                    actual_schedule_image_url,
                    created_at,
                    updated_at
                ) VALUES (
                    :date,
                    COALESCE(:reflection_text, ''),
                    COALESCE(:expected_schedule_image_url, ''),
                    COALESCE(:actual_schedule_image_url, ''),
                    :timestamp,
                    :timestamp
                )
                ON CONFLICT(date) DO UPDATE SET
                    reflection_text = COALESCE(:reflection_text, entries.reflection_text),
                    expected_schedule_image_url =
                        COALESCE(:expected_schedule_image_url, entries.expected_schedule_image_url),
                    actual_schedule_image_url =
                        COALESCE(:actual_schedule_image_url, entries.actual_schedule_image_url),
                    updated_at = :timestamp
            "#,
            named_params! {
                ":date": date.to_string(),
                ":reflection_text": &input.reflection_text,
                ":expected_schedule_image_url": &input.expected_schedule_image_url,
                ":actual_schedule_image_url": &input.actual_schedule_image_url,
                ":timestamp": timestamp,
            },
        )?;

        Self::find_by_date(conn, date)?.ok_or_else(AppError::not_found)
    }

    pub fn delete(conn: &Connection, date: &DateKey) -> AppResult<bool> {
        let deleted = conn.execute(
            "DELETE FROM entries WHERE date = :date",
            named_params! {":date": date.to_string()},
        )?;
        Ok(deleted > 0)
    }

    /// Entries with `start <= date <= end`, oldest first.
    pub fn list_between(
        conn: &Connection,
        start: &DateKey,
        end: &DateKey,
    ) -> AppResult<Vec<EntryRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE date >= :start AND date <= :end ORDER BY date ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                named_params! {":start": start.to_string(), ":end": end.to_string()},
                |row| EntryRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(EntryRow::into_record))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Every entry dated on or before `end`, oldest first.
    pub fn list_up_to(conn: &Connection, end: &DateKey) -> AppResult<Vec<EntryRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE date <= :end ORDER BY date ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! {":end": end.to_string()}, |row| {
                EntryRow::try_from(row)
            })?
            .map(|row| row.map_err(AppError::from).and_then(EntryRow::into_record))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Newest entries first.
    pub fn list_recent(conn: &Connection, limit: usize) -> AppResult<Vec<EntryRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY date DESC LIMIT :limit");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! {":limit": limit as i64}, |row| {
                EntryRow::try_from(row)
            })?
            .map(|row| row.map_err(AppError::from).and_then(EntryRow::into_record))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// 1-based position of `date` among all entry dates; the "day X" of the journal.
    pub fn day_number(conn: &Connection, date: &DateKey) -> AppResult<i64> {
        let position: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE date <= :date",
            named_params! {":date": date.to_string()},
            |row| row.get(0),
        )?;
        Ok(position)
    }

    pub fn count(conn: &Connection) -> AppResult<i64> {
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(total)
    }

    /// Every stored date, oldest first.
    pub fn list_dates(conn: &Connection) -> AppResult<Vec<DateKey>> {
        let mut stmt = conn.prepare("SELECT date FROM entries ORDER BY date ASC")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|row| -> AppResult<DateKey> {
                let raw = row?;
                DateKey::parse(&raw).ok_or_else(|| {
                    AppError::database(format!("stored entry has invalid date {raw:?}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(dates)
    }

    /// Per-field completion counts, plus whether `today` already has an entry.
    pub fn status(conn: &Connection, today: &DateKey) -> AppResult<EntryStatus> {
        let status = conn.query_row(
            r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(reflection_text <> ''), 0),
                    COALESCE(SUM(expected_schedule_image_url <> ''), 0),
                    COALESCE(SUM(actual_schedule_image_url <> ''), 0),
                    COALESCE(SUM(date = :today), 0)
                FROM entries
            "#,
            named_params! {":today": today.to_string()},
            |row| {
                Ok(EntryStatus {
                    total: row.get(0)?,
                    with_reflection: row.get(1)?,
                    with_expected_schedule: row.get(2)?,
                    with_actual_schedule: row.get(3)?,
                    has_today_entry: row.get::<_, i64>(4)? > 0,
                })
            },
        )?;
        Ok(status)
    }
}
