// ABOUTME: Unified error handling with error codes and HTTP response mapping
// ABOUTME: Defines AppError, ErrorCode, and the wire-format failure envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mealforge

//! # Unified Error Handling
//!
//! Centralized error types for the Mealforge service. Every failure that can
//! reach a caller is an [`AppError`] carrying an [`ErrorCode`], which maps to
//! an HTTP status and a stable machine-readable `type` string.
//!
//! Parse/shape failures from the language model never surface here: those are
//! recovered inside the engine via the fallback generator. What reaches the
//! caller is validation errors, credential errors, upstream transport errors,
//! and persistence errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 3002,

    // External services (5000-5999)
    #[serde(rename = "MODEL_UNAVAILABLE")]
    ModelUnavailable = 5000,
    #[serde(rename = "MODEL_EMPTY_RESPONSE")]
    ModelEmptyResponse = 5001,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "PERSISTENCE_ERROR")]
    PersistenceError = 9001,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::ValueOutOfRange => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::ModelUnavailable | Self::ModelEmptyResponse => 502,
            Self::ConfigError | Self::InternalError | Self::PersistenceError => 500,
        }
    }

    /// Stable machine-readable `type` string for the failure envelope
    ///
    /// Persistence failures get their own type: the user spent a generation
    /// on a recipe that was produced but not stored, which downstream
    /// clients display differently from a generation failure.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::AuthRequired | Self::AuthInvalid => "auth_error",
            Self::InvalidInput | Self::MissingRequiredField | Self::ValueOutOfRange => {
                "validation_error"
            }
            Self::ModelUnavailable | Self::ModelEmptyResponse => "model_error",
            Self::ConfigError => "config_error",
            Self::InternalError => "internal_error",
            Self::PersistenceError => "persistence_error",
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ValueOutOfRange => "The provided value is outside the acceptable range",
            Self::ModelUnavailable => "The language model service is unavailable",
            Self::ModelEmptyResponse => "The language model returned an empty response",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::PersistenceError => "The generated meal could not be stored",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP failure envelope
///
/// Wire contract consumed by downstream clients:
/// `{error: string, timestamp: ISO8601, type: string}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// ISO 8601 timestamp of the failure
    pub timestamp: String,
    /// Stable machine-readable error type
    #[serde(rename = "type")]
    pub error_type: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.message.clone(),
            timestamp: Utc::now().to_rfc3339(),
            error_type: error.code.type_str().to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from(&self);
        (status, Json(body)).into_response()
    }
}

/// Convenience constructors for common errors
impl AppError {
    /// Authentication required
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing required field
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {}", field.into()),
        )
    }

    /// Upstream model transport failure
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelUnavailable, message)
    }

    /// Upstream model returned an empty body
    pub fn model_empty_response() -> Self {
        Self::new(
            ErrorCode::ModelEmptyResponse,
            "Model returned an empty response body",
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Persistence failure after a successful generation
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceError, message)
    }
}

/// Conversion from sqlx errors: every database failure is a persistence error
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::persistence(error.to_string()).with_source(error)
    }
}

/// Conversion from anyhow::Error to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::ModelUnavailable.http_status(), 502);
        assert_eq!(ErrorCode::PersistenceError.http_status(), 500);
    }

    #[test]
    fn test_error_response_envelope() {
        let error = AppError::invalid_input("ingredients must be non-empty");
        let envelope = ErrorResponse::from(&error);

        assert_eq!(envelope.error, "ingredients must be non-empty");
        assert_eq!(envelope.error_type, "validation_error");
        assert!(!envelope.timestamp.is_empty());
    }

    #[test]
    fn test_persistence_error_is_distinct_type() {
        let error = AppError::persistence("insert failed");
        assert_eq!(error.code.type_str(), "persistence_error");
        assert_ne!(
            error.code.type_str(),
            AppError::internal("x").code.type_str()
        );
    }
}
