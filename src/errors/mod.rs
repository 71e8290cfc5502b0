use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::resources::Flash;
use crate::utils::validation::FieldErrors;

pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
pub const VALIDATION_MESSAGE: &str = "Please check the form for errors and try again.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug)]
pub enum AppError {
    /// Field-level failures, returned with the submitted input so the form can be redisplayed.
    Validation { errors: FieldErrors, old: Value },
    Forbidden,
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    /// A mutation failed after validation. Only the user-safe message is kept, plus the
    /// submitted input when the form should be redisplayed.
    Application { message: String, old: Option<Value> },
    BadRequest(String),
}

impl AppError {
    pub fn validation<T: Serialize>(errors: FieldErrors, input: &T) -> Self {
        AppError::Validation {
            errors,
            old: serde_json::to_value(input).unwrap_or_default(),
        }
    }

    /// Logs the underlying cause and keeps only `message` for the client.
    pub fn application(message: &str, cause: impl fmt::Display) -> Self {
        log::error!("{}: {}", message, cause);
        AppError::Application {
            message: message.to_string(),
            old: None,
        }
    }

    /// Attaches the submitted input to an application error; other variants are unchanged.
    pub fn with_input<T: Serialize>(self, input: &T) -> Self {
        match self {
            AppError::Application { message, .. } => AppError::Application {
                message,
                old: serde_json::to_value(input).ok(),
            },
            other => other,
        }
    }
}

/// `map_err` adapter turning any lower-layer error into a generic application error.
pub fn fail_with<E: fmt::Display>(message: &'static str) -> impl FnOnce(E) -> AppError {
    move |err| AppError::application(message, err)
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    flash: Flash,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old: Option<&'a Value>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { errors, .. } => write!(f, "Validation failed: {}", errors),
            AppError::Forbidden => write!(f, "Forbidden: {}", FORBIDDEN_MESSAGE),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Application { message, .. } => write!(f, "Application Error: {}", message),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Application { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { errors, old } => ErrorResponse {
                flash: Flash::error(VALIDATION_MESSAGE),
                errors: Some(errors),
                old: Some(old),
            },
            AppError::Forbidden => ErrorResponse {
                flash: Flash::error(FORBIDDEN_MESSAGE),
                errors: None,
                old: None,
            },
            AppError::Application { message, old } => ErrorResponse {
                flash: Flash::error(message),
                errors: None,
                old: old.as_ref(),
            },
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg) => ErrorResponse {
                flash: Flash::error(msg),
                errors: None,
                old: None,
            },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// File storage failures.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification queue is closed")]
    QueueClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}
