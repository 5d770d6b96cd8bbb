pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::commands::{AppState, CommandResult};
use crate::models::settings::HeatmapConfig;
use crate::utils::clock::SystemClock;

pub fn run() {
    if let Err(error) = try_run() {
        eprintln!("failed to build heatmap report: {error}");
        std::process::exit(1);
    }
}

fn try_run() -> Result<(), Box<dyn std::error::Error>> {
    let config = HeatmapConfig::from_env()?;
    crate::utils::logger::init_logging(&config.log_dir)?;
    info!(target: "app::config", config = ?config, "starting planner heatmap");
    config.log_summary();
    for warning in config.warnings() {
        warn!(target: "app::config", %warning, "partial heatmap configuration");
    }

    let pool = crate::db::DbPool::new(config.db_path.clone())?;
    let state = AppState::new(config, pool, Arc::new(SystemClock))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(build_report(&state));

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn build_report(state: &AppState) -> JsonValue {
    let config = commands::heatmap::heatmap_config_get(state).await;
    let dashboard = commands::heatmap::heatmap_dashboard_fetch(state).await;
    let streak = commands::entries::entries_streak_fetch(state).await;
    let health = commands::health::health_check(state).await;

    json!({
        "config": command_json(config),
        "dashboard": command_json(dashboard),
        "journalStreak": command_json(streak),
        "health": command_json(health),
    })
}

fn command_json<T: Serialize>(result: CommandResult<T>) -> JsonValue {
    let value = match result {
        Ok(value) => serde_json::to_value(value),
        Err(error) => serde_json::to_value(error).map(|error| json!({ "error": error })),
    };
    value.unwrap_or_else(|err| json!({ "error": { "code": "UNKNOWN", "message": err.to_string() } }))
}
