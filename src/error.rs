use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::activity::ActivitySource;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("record conflict: {message}")]
    Conflict { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("{origin}: {message}")]
    Source {
        origin: ActivitySource,
        message: String,
        status: Option<u16>,
    },

    #[error("{origin}: network error ({message})")]
    Network {
        origin: ActivitySource,
        message: String,
    },

    #[error("{origin}: request timed out")]
    Timeout { origin: ActivitySource },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("all activity sources failed: {}", failures.join("; "))]
    AllSourcesFailed { failures: Vec<String> },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::heatmap::parse", %message, "parse error");
        AppError::Parse { message }
    }

    pub fn source(origin: ActivitySource, message: impl Into<String>) -> Self {
        Self::source_with_status(origin, message, None)
    }

    pub fn source_with_status(
        origin: ActivitySource,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        let message = message.into();
        match status {
            Some(code) => {
                warn!(target: "app::heatmap::source", origin = %origin, status = code, %message)
            }
            None => warn!(target: "app::heatmap::source", origin = %origin, %message),
        }
        AppError::Source {
            origin,
            message,
            status,
        }
    }

    pub fn network(origin: ActivitySource, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::heatmap::source", origin = %origin, %message, "network error");
        AppError::Network { origin, message }
    }

    pub fn timeout(origin: ActivitySource) -> Self {
        warn!(target: "app::heatmap::source", origin = %origin, "request timed out");
        AppError::Timeout { origin }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::config", %message, "configuration error");
        AppError::Configuration { message }
    }

    pub fn all_sources_failed(failures: Vec<String>) -> Self {
        error!(target: "app::heatmap", failures = ?failures, "every activity source failed");
        AppError::AllSourcesFailed { failures }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::conflict", %message, "conflict error");
        AppError::Conflict { message }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "forbidden operation");
        AppError::Forbidden { message }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    /// Source the error is attributed to, for upstream fetch failures.
    pub fn origin(&self) -> Option<ActivitySource> {
        match self {
            AppError::Source { origin, .. }
            | AppError::Network { origin, .. }
            | AppError::Timeout { origin } => Some(*origin),
            _ => None,
        }
    }

    /// Upstream failures may be answered from a previously cached payload.
    /// Configuration errors never are: no payload can exist for them.
    pub fn allows_cache_fallback(&self) -> bool {
        matches!(
            self,
            AppError::Source { .. } | AppError::Network { .. } | AppError::Timeout { .. }
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict("unique or check constraint violated")
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
