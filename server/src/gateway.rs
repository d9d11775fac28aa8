//! The Data Gateway: this server's view of the remote store and identity
//! provider.
//!
//! Handlers never talk to the remote platform directly. They hold an
//! `Arc<dyn DataGateway>` in [`crate::routes::AppState`], which is the
//! production [`crate::supabase::SupabaseClient`] at runtime and an in-memory
//! double in tests.
//!
//! Every operation makes exactly one remote call and reports failure through
//! the single [`GatewayError`] type.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{LoginRequest, SignupRequest};
use crate::types::Record;

/// Result type returned by every gateway operation.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised by the remote store or identity provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote platform answered with a non-success status.
    ///
    /// `message` is the remote's own explanation, passed through verbatim.
    #[error("remote rejected request ({status}): {message}")]
    Remote {
        /// HTTP status returned by the remote.
        status: u16,
        /// The remote's error message.
        message: String,
    },

    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The remote platform could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The remote answered successfully but with a body we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The gateway could not be constructed.
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Text suitable for the `detail` field of an error response.
    ///
    /// Remote rejections surface the remote message unchanged; other failures
    /// use their display form.
    pub fn detail(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The remote operations a handler can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListEvents,
    InsertEvent,
    UpdateEvent,
    DeleteEvent,
    SignUp,
    SignIn,
}

impl Operation {
    /// Stable name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListEvents => "list-events",
            Self::InsertEvent => "insert-event",
            Self::UpdateEvent => "update-event",
            Self::DeleteEvent => "delete-event",
            Self::SignUp => "sign-up",
            Self::SignIn => "sign-in",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table-scoped CRUD over `events` plus the two identity calls.
///
/// Implementations must be safe to share between concurrent requests; the
/// remote store serialises writes, so no locking is expected here.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Returns every stored event, unfiltered, in the store's order.
    async fn list_events(&self) -> GatewayResult<Vec<Record>>;

    /// Inserts one event and returns the stored row, including its new `id`.
    async fn insert_event(&self, record: Record) -> GatewayResult<Record>;

    /// Applies `changes` to the event with `id`.
    ///
    /// Returns the updated rows; an unknown `id` yields an empty vector.
    async fn update_event(&self, id: &str, changes: Record) -> GatewayResult<Vec<Record>>;

    /// Deletes the event with `id`. Deleting a missing row is not an error.
    async fn delete_event(&self, id: &str) -> GatewayResult<()>;

    /// Registers a user and returns the provider's payload untouched.
    async fn sign_up(&self, request: &SignupRequest) -> GatewayResult<Value>;

    /// Signs a user in with email and password.
    async fn sign_in(&self, request: &LoginRequest) -> GatewayResult<Value>;
}
