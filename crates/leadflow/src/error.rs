use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::prospecting::{CatalogError, ProspectingError};
use crate::workflows::prospecting::router::error_response;
use crate::workflows::seed::ContactSeedError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Catalog(CatalogError),
    Seed(ContactSeedError),
    Roster(serde_json::Error),
    Prospecting(ProspectingError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Seed(err) => write!(f, "contact seed error: {}", err),
            AppError::Roster(err) => write!(f, "agent roster error: {}", err),
            AppError::Prospecting(err) => write!(f, "prospecting error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Seed(err) => Some(err),
            AppError::Roster(err) => Some(err),
            AppError::Prospecting(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Prospecting(err) => return error_response(err),
            AppError::Catalog(_) | AppError::Seed(_) | AppError::Roster(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ContactSeedError> for AppError {
    fn from(value: ContactSeedError) -> Self {
        Self::Seed(value)
    }
}

impl From<ProspectingError> for AppError {
    fn from(value: ProspectingError) -> Self {
        Self::Prospecting(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prospecting_errors_keep_their_http_mapping() {
        let response = AppError::from(ProspectingError::LeaseConflict).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn seed_errors_are_client_errors() {
        let err = AppError::from(ContactSeedError::InvalidRow {
            row: 4,
            reason: "callback status requires next_action_date".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "contact seed error: contact row 4 rejected: callback status requires next_action_date"
        );
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
