use crate::models::heatmap::HealthStatus;

use super::{run_blocking, AppState, CommandResult};

pub async fn health_check(state: &AppState) -> CommandResult<HealthStatus> {
    let service = state.entries();
    run_blocking(move || Ok(service.health())).await
}
