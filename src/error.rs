use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// No game carries the requested name.
    #[error("Cannot find any game with Name [{0}]")]
    NotFound(String),
    /// A game with the same name is already stored.
    #[error("The game [{0}] already exists")]
    AlreadyExists(String),
    /// The game changed between the read and the version-checked write.
    #[error("The game [{name}] was modified concurrently, please retry")]
    Conflict {
        /// Name of the contended game.
        name: String,
        /// Storage level detail.
        #[source]
        source: StorageError,
    },
}

impl ServiceError {
    /// Wrap a storage failure that happened while working on the game `name`.
    pub fn from_storage(name: &str, err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => ServiceError::Conflict {
                name: name.to_owned(),
                source: err,
            },
            StorageError::Duplicate { name } => ServiceError::AlreadyExists(name),
            StorageError::Unavailable { .. } => ServiceError::Unavailable(err),
        }
    }

    /// Whether retrying the whole operation may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict { .. })
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Request body failed field validation, one message per offending field.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("{0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::NotFound(_) => AppError::NotFound(err.to_string()),
            ServiceError::AlreadyExists(_) => AppError::BadRequest(err.to_string()),
            ServiceError::Conflict { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let mut messages = err
            .errors()
            .iter()
            .flat_map(|(field, kind)| match kind {
                ValidationErrorsKind::Field(errors) => errors
                    .iter()
                    .map(|error| {
                        let reason = error
                            .message
                            .as_deref()
                            .map(str::to_owned)
                            .unwrap_or_else(|| error.code.to_string());
                        invalid_value_message(field, &reason)
                    })
                    .collect::<Vec<_>>(),
                _ => vec![invalid_value_message(field, "invalid nested value")],
            })
            .collect::<Vec<_>>();
        messages.sort();
        AppError::Validation(messages)
    }
}

/// Message used for every rejected request field.
pub fn invalid_value_message(field: &str, reason: &str) -> String {
    format!("'{field}' has an invalid value '{reason}'")
}

/// Body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// One entry per reported problem.
    pub errors: Vec<ErrorEntry>,
}

/// Single error message inside an [`ErrorResponse`].
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    /// Human readable description.
    pub error_message: String,
}

impl ErrorResponse {
    fn from_messages(messages: impl IntoIterator<Item = String>) -> Self {
        Self {
            errors: messages
                .into_iter()
                .map(|error_message| ErrorEntry { error_message })
                .collect(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = match self {
            AppError::Validation(messages) => ErrorResponse::from_messages(messages),
            other => ErrorResponse::from_messages([other.to_string()]),
        };

        (status, Json(body)).into_response()
    }
}
