use serde::Serialize;
use tracing::info;

use super::{AppState, CommandResult};

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearResult {
    pub entries_cleared: usize,
}

pub async fn cache_clear_all(state: &AppState) -> CommandResult<CacheClearResult> {
    let entries_cleared = state.heatmap().clear_cache();
    info!(target: "app::command", entries_cleared, "cache cleared by command");
    Ok(CacheClearResult { entries_cleared })
}
