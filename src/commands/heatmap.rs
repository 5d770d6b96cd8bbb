use tracing::debug;

use crate::models::heatmap::{CalendarResponse, DashboardResponse};
use crate::models::settings::HeatmapConfigStatus;

use super::{AppState, CommandError, CommandResult};

pub async fn heatmap_dashboard_fetch(state: &AppState) -> CommandResult<DashboardResponse> {
    let response = state.heatmap().dashboard().await?;
    debug!(
        target: "app::command",
        days = response.combined_data.len(),
        stale = response.stale,
        "heatmap dashboard fetched"
    );
    Ok(response)
}

pub async fn heatmap_calendar_fetch(state: &AppState) -> CommandResult<CalendarResponse> {
    state
        .heatmap()
        .calendar()
        .await
        .map_err(CommandError::from)
}

pub async fn heatmap_config_get(state: &AppState) -> CommandResult<HeatmapConfigStatus> {
    Ok(state.heatmap().config_status())
}
