//! HTTP route handlers for the UniNear server.
//!
//! This module provides the HTTP API endpoints:
//!
//! - `GET /` - Liveness message
//! - `GET /events` - List every event
//! - `POST /events` - Create an event
//! - `PATCH /events/{event_id}` - Partially update an event
//! - `DELETE /events/{event_id}` - Delete an event
//! - `POST /auth/signup` - Register a user
//! - `POST /auth/login` - Sign a user in
//!
//! # Architecture
//!
//! All routes share application state through [`AppState`], which contains:
//! - Configuration (including CORS settings)
//! - The [`DataGateway`] used for every remote call
//!
//! Each handler validates its body with [`crate::schema`], makes a single
//! gateway call, and maps failures through [`ApiError`].
//!
//! No handler checks who the caller is: anyone who can reach a route can use
//! it. Access control, if any, is whatever the remote platform enforces for
//! the configured key.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use uninear_server::config::Config;
//! use uninear_server::routes::{create_router, AppState};
//! use uninear_server::supabase::SupabaseClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let gateway = SupabaseClient::new(&config.supabase_url, &config.supabase_key)
//!         .expect("failed to build client");
//!     let app = create_router(AppState::new(config, Arc::new(gateway)));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::Config;
use crate::cors::cors_layer;
use crate::error::ApiError;
use crate::gateway::{DataGateway, Operation};
use crate::schema::{self, DATE_FIELD, START_TIME_FIELD};
use crate::types::Record;

// ============================================================================
// Constants
// ============================================================================

/// Maximum accepted request body size (1 MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Message returned by `GET /`.
pub const LIVE_MESSAGE: &str = "UniNear API is Live 🚀";

/// Message returned after a delete.
pub const DELETED_MESSAGE: &str = "Event deleted successfully";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
///
/// Cloned for each request; the gateway is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Handle to the remote store and identity provider.
    pub gateway: Arc<dyn DataGateway>,
}

impl AppState {
    /// Creates application state from configuration and a gateway.
    #[must_use]
    pub fn new(config: Config, gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("gateway", &"<DataGateway>")
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes and layers configured.
///
/// Layers, outermost first: request tracing, CORS, body size limit.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(get_root))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{event_id}", patch(update_event).delete(delete_event))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Renames the wire field `date` to the stored column `start_time`.
///
/// Does nothing when `date` is absent, so partial updates that leave the
/// start time alone never touch it.
pub fn rename_date_field(record: &mut Record) {
    if let Some(date) = record.remove(DATE_FIELD) {
        record.insert(START_TIME_FIELD.to_string(), date);
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Response body for `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Response body carrying a confirmation message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Liveness check. Makes no remote call.
async fn get_root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: LIVE_MESSAGE.to_string(),
    })
}

/// GET /events - List every stored event.
///
/// # Responses
///
/// - `200 OK` - JSON array of events, as stored
/// - `500 Internal Server Error` - the remote store failed
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    let events = state
        .gateway
        .list_events()
        .await
        .map_err(|e| ApiError::gateway(Operation::ListEvents, e))?;

    debug!(count = events.len(), "Listed events");
    Ok(Json(events))
}

/// POST /events - Create an event.
///
/// # Responses
///
/// - `200 OK` - the created event, including its assigned `id`
/// - `422 Unprocessable Entity` - the body failed validation
/// - `400 Bad Request` - the remote store rejected the insert
async fn create_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Record>, ApiError> {
    let payload = schema::parse_body(&body)?;
    let event = schema::validate_create(&payload)?;

    let mut record = event.into_record();
    rename_date_field(&mut record);

    let created = state
        .gateway
        .insert_event(record)
        .await
        .map_err(|e| ApiError::gateway(Operation::InsertEvent, e))?;

    info!(event_id = ?created.get("id"), "Event created");
    Ok(Json(created))
}

/// PATCH /events/{event_id} - Apply a partial update.
///
/// Only fields present in the body are sent to the store.
///
/// # Responses
///
/// - `200 OK` - array of updated rows (empty if no event has that id)
/// - `422 Unprocessable Entity` - a supplied field could not be coerced
/// - `400 Bad Request` - the remote store rejected the update
async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<Record>>, ApiError> {
    let payload = schema::parse_body(&body)?;
    let update = schema::validate_update(&payload)?;

    let mut changes = update.into_record();
    rename_date_field(&mut changes);

    let updated = state
        .gateway
        .update_event(&event_id, changes)
        .await
        .map_err(|e| ApiError::gateway(Operation::UpdateEvent, e))?;

    info!(event_id = %event_id, rows = updated.len(), "Event updated");
    Ok(Json(updated))
}

/// DELETE /events/{event_id} - Delete an event.
///
/// Succeeds whether or not the event existed.
///
/// # Responses
///
/// - `200 OK` - `{"message": "Event deleted successfully"}`
/// - `400 Bad Request` - the remote store rejected the delete
async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .gateway
        .delete_event(&event_id)
        .await
        .map_err(|e| ApiError::gateway(Operation::DeleteEvent, e))?;

    info!(event_id = %event_id, "Event deleted");
    Ok(Json(MessageResponse {
        message: DELETED_MESSAGE.to_string(),
    }))
}

/// POST /auth/signup - Register a user with the identity provider.
///
/// Returns the provider's payload unchanged.
async fn signup(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let payload = schema::parse_body(&body)?;
    let request = schema::validate_signup(&payload)?;

    let response = state
        .gateway
        .sign_up(&request)
        .await
        .map_err(|e| ApiError::gateway(Operation::SignUp, e))?;

    info!("User signed up");
    Ok(Json(response))
}

/// POST /auth/login - Sign in with email and password.
///
/// Returns the provider's session payload unchanged.
async fn login(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let payload = schema::parse_body(&body)?;
    let request = schema::validate_login(&payload)?;

    let session = state
        .gateway
        .sign_in(&request)
        .await
        .map_err(|e| ApiError::gateway(Operation::SignIn, e))?;

    info!("User signed in");
    Ok(Json(session))
}

// ============================================================================
// Tests
// ============================================================================
