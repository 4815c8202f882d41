// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("No user logged in")]
    NoSession,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication provider error: {0}")]
    AuthProvider(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Query requires an index that is still being built: {0}")]
    MissingIndex(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DataAccess(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, also recorded in error log entries.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthenticationRequired => "authentication_required",
            AppError::NoSession => "no_session",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AuthProvider(_) => "auth_provider_error",
            AppError::NotFound(_) => "not_found",
            AppError::MissingIndex(_) => "missing_index",
            AppError::Validation(_) => "bad_request",
            AppError::DataAccess(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationRequired | AppError::NoSession => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AuthProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingIndex(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DataAccess(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a store failure message.
    ///
    /// Firestore reports composite queries without a backing index as
    /// `FAILED_PRECONDITION` with a link to create the index.
    pub fn from_store_message(message: String) -> Self {
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("failed_precondition")
            || lowered.contains("failedprecondition")
            || lowered.contains("failed-precondition")
            || lowered.contains("requires an index")
        {
            AppError::MissingIndex(message)
        } else {
            AppError::DataAccess(message)
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("Template rendering failed"))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = match &self {
            AppError::NotFound(_)
            | AppError::Validation(_)
            | AppError::AuthProvider(_)
            | AppError::InvalidCredentials => Some(self.to_string()),
            AppError::DataAccess(msg) | AppError::MissingIndex(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            AppError::AuthenticationRequired | AppError::NoSession => None,
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
