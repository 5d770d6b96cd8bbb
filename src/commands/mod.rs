pub mod cache;
pub mod entries;
pub mod health;
pub mod heatmap;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tokio::task;
use tracing::{error, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::HeatmapConfig;
use crate::services::entry_service::EntryService;
use crate::services::heatmap_service::{ActivityCache, HeatmapService};
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    heatmap_service: Arc<HeatmapService>,
    entry_service: Arc<EntryService>,
}

impl AppState {
    pub fn new(config: HeatmapConfig, db_pool: DbPool, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let cache = Arc::new(ActivityCache::new(Arc::clone(&clock)));
        let entry_service = Arc::new(EntryService::new(
            db_pool.clone(),
            config.zone,
            Arc::clone(&clock),
        ));
        let heatmap_service = Arc::new(HeatmapService::from_config(
            config,
            db_pool,
            cache,
            clock,
        )?);

        Ok(Self {
            heatmap_service,
            entry_service,
        })
    }

    pub fn heatmap(&self) -> Arc<HeatmapService> {
        Arc::clone(&self.heatmap_service)
    }

    pub fn entries(&self) -> Arc<EntryService> {
        Arc::clone(&self.entry_service)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation { message, details } => {
                CommandError::new("VALIDATION_ERROR", message, details)
            }
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "requested entry does not exist", None)
            }
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Forbidden { message } => CommandError::new("FORBIDDEN", message, None),
            AppError::Parse { message } => CommandError::new("PARSE_ERROR", message, None),
            AppError::Source {
                origin,
                message,
                status,
            } => CommandError::new(
                "SOURCE_ERROR",
                format!("{origin}: {message}"),
                Some(json!({ "source": origin, "status": status })),
            ),
            AppError::Network { origin, message } => {
                warn!(target: "app::command", source = %origin, %message, "network error in command");
                CommandError::new(
                    "NETWORK_ERROR",
                    format!("{origin}: {message}"),
                    Some(json!({ "source": origin })),
                )
            }
            AppError::Timeout { origin } => CommandError::new(
                "TIMEOUT",
                format!("{origin}: request timed out"),
                Some(json!({ "source": origin })),
            ),
            AppError::Configuration { message } => {
                CommandError::new("CONFIGURATION_ERROR", message, None)
            }
            AppError::AllSourcesFailed { failures } => CommandError::new(
                "ALL_SOURCES_FAILED",
                "no activity source returned data",
                Some(json!({ "failures": failures })),
            ),
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "file system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

pub(crate) async fn run_blocking<T: Send + 'static>(
    work: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    task::spawn_blocking(work)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("blocking task failed: {err}"), None))?
        .map_err(CommandError::from)
}
