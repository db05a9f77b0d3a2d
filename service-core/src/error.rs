//! Application error taxonomy and its single mapping to the wire contract.
//!
//! Handlers and stores raise [`AppError`]; [`AppError::shape`] is the only
//! place a failure kind is turned into an HTTP status, a machine-readable
//! message code and a human message. The envelope middleware renders the
//! resulting [`ErrorShape`] so clients always receive one uniform body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::response::{Envelope, MessageCode};

/// Message code attached to validation and constraint failures.
pub const CODE_INVALID: &str = "INVALID";

/// Reasons a request can fail authentication. Each carries a distinct
/// message code so clients can tell an expired token from a bad one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing authorization header")]
    MissingToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("Refresh token expired")]
    RefreshExpired,
    #[error("Invalid refresh token")]
    RefreshInvalid,
    #[error("Unauthorized access")]
    IdentityMismatch,
    #[error("Invalid credentials")]
    BadCredentials,
    #[error("User not found")]
    UnknownUser,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "TOKEN_MISSING",
            AuthFailure::TokenExpired => "TOKEN_EXPIRED",
            AuthFailure::TokenInvalid => "TOKEN_INVALID",
            AuthFailure::RefreshExpired => "REFRESH_TOKEN_EXPIRED",
            AuthFailure::RefreshInvalid => "REFRESH_TOKEN_INVALID",
            AuthFailure::IdentityMismatch => "IDENTITY_MISMATCH",
            AuthFailure::BadCredentials => "INVALID_CREDENTIALS",
            AuthFailure::UnknownUser => "UNKNOWN_USER",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry on {field}")]
    UniqueViolation { field: String },

    #[error("Foreign key constraint violated")]
    ForeignKeyViolation,

    #[error("Not null constraint violated")]
    NotNullViolation,

    #[error("{message}")]
    Domain {
        status: StatusCode,
        message_code: Option<String>,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Domain {
            status: StatusCode::BAD_REQUEST,
            message_code: Some(CODE_INVALID.to_string()),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn domain(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Domain {
            status,
            message_code: None,
            message: message.into(),
        }
    }

    /// Map this failure kind to the uniform wire contract.
    pub fn shape(&self) -> ErrorShape {
        match self {
            AppError::Validation(errors) => ErrorShape {
                status: StatusCode::BAD_REQUEST,
                message_code: MessageCode::Text(CODE_INVALID.to_string()),
                message: "Validation failed".to_string(),
                validation_errors: Some(validation_map(errors)),
            },
            AppError::Unauthenticated(reason) => ErrorShape {
                status: StatusCode::UNAUTHORIZED,
                message_code: MessageCode::Text(reason.code().to_string()),
                message: reason.to_string(),
                validation_errors: None,
            },
            AppError::NotFound(message) => ErrorShape {
                status: StatusCode::NOT_FOUND,
                message_code: MessageCode::Number(StatusCode::NOT_FOUND.as_u16()),
                message: capitalize_first(message),
                validation_errors: None,
            },
            AppError::UniqueViolation { field } => ErrorShape {
                status: StatusCode::CONFLICT,
                message_code: MessageCode::Text(CODE_INVALID.to_string()),
                message: format!("Duplicate entry: {field} already exists."),
                validation_errors: None,
            },
            AppError::ForeignKeyViolation => ErrorShape {
                status: StatusCode::CONFLICT,
                message_code: MessageCode::Text(CODE_INVALID.to_string()),
                message: "Foreign key constraint violated".to_string(),
                validation_errors: None,
            },
            AppError::NotNullViolation => ErrorShape {
                status: StatusCode::BAD_REQUEST,
                message_code: MessageCode::Text(CODE_INVALID.to_string()),
                message: "Not null constraint violated".to_string(),
                validation_errors: None,
            },
            AppError::Domain {
                status,
                message_code,
                message,
            } => ErrorShape {
                status: *status,
                message_code: message_code
                    .clone()
                    .map(MessageCode::Text)
                    .unwrap_or(MessageCode::Number(status.as_u16())),
                message: capitalize_first(message),
                validation_errors: None,
            },
            // Store-level error strings are never surfaced to clients.
            AppError::Database(_) | AppError::Config(_) => ErrorShape {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message_code: MessageCode::Number(500),
                message: "An unexpected error occurred".to_string(),
                validation_errors: None,
            },
            AppError::Unexpected(err) => {
                let message = err.to_string();
                ErrorShape {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message_code: MessageCode::Number(500),
                    message: if message.is_empty() {
                        "An unexpected error occurred".to_string()
                    } else {
                        capitalize_first(&message)
                    },
                    validation_errors: None,
                }
            }
        }
    }
}

/// Wire mapping of one failure: status, code, message and, for validation
/// failures, the per-field breakdown.
#[derive(Debug, Clone)]
pub struct ErrorShape {
    pub status: StatusCode,
    pub message_code: MessageCode,
    pub message: String,
    pub validation_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Render a path-less envelope so even a response that bypasses the
        // envelope middleware is never an inconsistent shape; the middleware
        // rebuilds it with the request path when present.
        let shape = self.shape();
        let envelope = Envelope::failure("", &shape);
        let mut response = (shape.status, Json(envelope)).into_response();
        response.extensions_mut().insert(shape);
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return AppError::NotFound("Record not found".to_string());
        }

        if let sqlx::Error::Database(ref db) = err {
            match db.code().as_deref() {
                Some("23505") => {
                    return AppError::UniqueViolation {
                        field: constraint_field(db.constraint()),
                    };
                }
                Some("23503") => return AppError::ForeignKeyViolation,
                Some("23502") => return AppError::NotNullViolation,
                _ => {}
            }
        }

        AppError::Database(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Unexpected(anyhow::Error::new(err))
    }
}

/// Derive the client-facing field name from a Postgres constraint name,
/// e.g. `users_user_id_key` -> `userId`.
fn constraint_field(constraint: Option<&str>) -> String {
    let Some(constraint) = constraint else {
        return "field".to_string();
    };

    let trimmed = constraint
        .trim_end_matches("_key")
        .trim_end_matches("_idx")
        .trim_end_matches("_unique");

    // Constraint names are `<table>_<column...>`; the leading segment is the
    // table name.
    let field = match trimmed.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => trimmed,
    };

    snake_to_camel(field)
}

fn validation_map(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
            .collect();
        map.insert(snake_to_camel(&field), messages);
    }
    map
}

pub(crate) fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub(crate) fn snake_to_camel(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut upper_next = false;
    for ch in text.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
