use serde::Deserialize;

use crate::models::entry::{
    EntryDates, EntryOverview, EntryRecord, EntryStatus, EntryUpsertInput, JournalStreak,
};
use crate::services::entry_service::DEFAULT_LIST_LIMIT;

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryListQuery {
    pub limit: Option<usize>,
}

pub async fn entries_get(state: &AppState, date: String) -> CommandResult<EntryRecord> {
    let service = state.entries();
    run_blocking(move || service.get_entry(&date)).await
}

pub async fn entries_upsert(
    state: &AppState,
    payload: EntryUpsertInput,
) -> CommandResult<EntryRecord> {
    let service = state.entries();
    run_blocking(move || service.upsert_entry(payload)).await
}

pub async fn entries_delete(state: &AppState, date: String) -> CommandResult<()> {
    let service = state.entries();
    run_blocking(move || service.delete_entry(&date)).await
}

pub async fn entries_list(
    state: &AppState,
    query: Option<EntryListQuery>,
) -> CommandResult<Vec<EntryOverview>> {
    let limit = query
        .and_then(|query| query.limit)
        .unwrap_or(DEFAULT_LIST_LIMIT);
    let service = state.entries();
    run_blocking(move || service.list_entries(limit)).await
}

/// Entry counts and whether today already has an entry.
pub async fn entries_status_fetch(state: &AppState) -> CommandResult<EntryStatus> {
    let service = state.entries();
    run_blocking(move || service.status()).await
}

pub async fn entries_dates_fetch(state: &AppState) -> CommandResult<EntryDates> {
    let service = state.entries();
    run_blocking(move || service.dates()).await
}

/// Flame-day streak as of today in the configured zone.
pub async fn entries_streak_fetch(state: &AppState) -> CommandResult<JournalStreak> {
    let today = state.heatmap().today();
    let service = state.entries();
    run_blocking(move || Ok(service.journal_streak(today))).await
}
