//! Error types for the UniNear HTTP API.
//!
//! Handlers return [`ApiError`], which renders itself as an HTTP response.
//!
//! # Error Types
//!
//! - [`ApiError::Validation`] - the request body failed schema validation;
//!   the remote platform was never called
//! - [`ApiError::Gateway`] - the remote store or identity provider failed
//!
//! # Status codes
//!
//! Validation failures are always `422`. Gateway failures use
//! [`gateway_failure_status`]: reads report `500` (a service fault), writes
//! and auth calls report `400` (a caller-correctable fault).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::gateway::{GatewayError, Operation};
use crate::schema::{FieldError, ValidationError};

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A remote call failed.
    #[error("{operation} failed: {source}")]
    Gateway {
        /// The operation that was attempted.
        operation: Operation,
        /// The underlying gateway failure.
        source: GatewayError,
    },
}

impl ApiError {
    /// Wraps a gateway failure with the operation that produced it.
    pub fn gateway(operation: Operation, source: GatewayError) -> Self {
        Self::Gateway { operation, source }
    }

    /// The HTTP status this error renders as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Gateway { operation, .. } => gateway_failure_status(*operation),
        }
    }
}

/// Status code reported when `operation` fails at the remote.
///
/// Listing events is a read: remote failure means the service is broken.
/// Everything else changes state (or authenticates), and remote rejection
/// there is something the caller can fix.
pub fn gateway_failure_status(operation: Operation) -> StatusCode {
    match operation {
        Operation::ListEvents => StatusCode::INTERNAL_SERVER_ERROR,
        Operation::InsertEvent => StatusCode::BAD_REQUEST,
        Operation::UpdateEvent => StatusCode::BAD_REQUEST,
        Operation::DeleteEvent => StatusCode::BAD_REQUEST,
        Operation::SignUp => StatusCode::BAD_REQUEST,
        Operation::SignIn => StatusCode::BAD_REQUEST,
    }
}

/// Body for gateway failures.
#[derive(Debug, Serialize)]
struct DetailResponse {
    detail: String,
}

/// Body for validation failures.
#[derive(Debug, Serialize)]
struct ValidationResponse<'a> {
    detail: &'a [FieldError],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Self::Validation(err) => {
                debug!(error = %err, "Rejected invalid request body");
                (
                    status,
                    Json(ValidationResponse {
                        detail: err.errors(),
                    }),
                )
                    .into_response()
            }
            Self::Gateway { operation, source } => {
                if status.is_server_error() {
                    error!(operation = %operation, error = %source, "Remote operation failed");
                } else {
                    warn!(operation = %operation, error = %source, "Remote operation rejected");
                }
                (
                    status,
                    Json(DetailResponse {
                        detail: source.detail(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
