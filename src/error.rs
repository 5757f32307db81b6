// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::store::{CollectionError, StoreError};
use crate::services::ServiceError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 400 as well: uniqueness violations are reported as bad input
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found, optionally with a client-facing explanation
    NotFound {
        message: String,
        detail: Option<String>,
    },

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound { message, .. } => message,
            ApiError::InternalServerError { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::ValidationError { field_errors: Some(field_errors), .. } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::NotFound { detail: Some(detail), .. } => {
                response["message"] = json!(detail);
            }
            ApiError::InternalServerError { details: Some(details), .. } => {
                response["details"] = json!(details);
            }
            _ => {}
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let problem = problem.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), problem.clone());
        ApiError::validation_error(problem, Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            detail: None,
        }
    }

    pub fn not_found_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            details: None,
        }
    }

    /// 500 carrying the underlying failure, used on organization mutation paths.
    pub fn internal_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Attach `message` to a 500 produced further down, keeping its detail.
    /// Other variants pass through untouched.
    pub fn with_context(self, message: &str) -> Self {
        match self {
            ApiError::InternalServerError { message: inner, details } => ApiError::InternalServerError {
                message: message.to_string(),
                details: details.or(Some(inner)),
            },
            other => other,
        }
    }

    /// Like [`ApiError::with_context`] but drops the underlying detail.
    pub fn masked(self, message: &str) -> Self {
        match self {
            ApiError::InternalServerError { .. } => ApiError::internal_server_error(message),
            other => other,
        }
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { field } => ApiError::conflict(field.conflict_message()),
            StoreError::NotFound => ApiError::not_found("Organization not found"),
            StoreError::Backend(msg) => {
                tracing::error!("Organization store error: {}", msg);
                ApiError::internal_with_details("Database error occurred", msg)
            }
        }
    }
}

impl From<CollectionError> for ApiError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::AlreadyExists(name) => {
                ApiError::conflict(format!("Collection '{}' already exists", name))
            }
            CollectionError::NotFound(name) => {
                tracing::error!("Collection '{}' missing during organization operation", name);
                ApiError::internal_with_details("Tenant collection is missing", format!("collection '{}' does not exist", name))
            }
            CollectionError::Backend(msg) => {
                tracing::error!("Collection store error: {}", msg);
                ApiError::internal_with_details("Database error occurred", msg)
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { field, message } => ApiError::invalid_field(field, message),
            ServiceError::MissingFields(message) => ApiError::bad_request(message),
            ServiceError::Conflict(message) => ApiError::conflict(message),
            ServiceError::NotFound(message) => ApiError::not_found(message),
            ServiceError::NameNotFound(name) => ApiError::not_found_with_detail(
                "Organization not found",
                format!("No organization exists with the name: \"{}\"", name),
            ),
            ServiceError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            ServiceError::Store(e) => e.into(),
            ServiceError::Collection(e) => e.into(),
            ServiceError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                ApiError::internal_with_details("Password processing failed", e.to_string())
            }
            ServiceError::Token(e) => {
                tracing::error!("Token generation error: {}", e);
                ApiError::internal_server_error("Failed to issue session token")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
