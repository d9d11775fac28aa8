//! Supabase-backed [`DataGateway`].
//!
//! Talks to the project's public HTTP API:
//! - PostgREST (`/rest/v1/events`) for event CRUD
//! - GoTrue (`/auth/v1/signup`, `/auth/v1/token`) for signup and login
//!
//! # Architecture
//!
//! The [`SupabaseClient`] is built once at startup and shared across all
//! requests (via `Arc`). It includes:
//! - A 5 second timeout on every request
//! - No retries: one remote call per operation
//! - Remote error messages surfaced verbatim through [`GatewayError::Remote`]
//!
//! # Example
//!
//! ```rust,ignore
//! use uninear_server::gateway::DataGateway;
//! use uninear_server::supabase::SupabaseClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SupabaseClient::new(
//!         "https://your-project.supabase.co",
//!         "your-api-key",
//!     )?;
//!
//!     for event in client.list_events().await? {
//!         println!("{:?}", event.get("title"));
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::gateway::{DataGateway, GatewayError, GatewayResult};
use crate::schema::{LoginRequest, SignupRequest};
use crate::types::Record;

/// Default timeout for Supabase API requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Table holding event rows.
const EVENTS_TABLE: &str = "events";

/// Asks PostgREST to echo written rows back.
const PREFER_REPRESENTATION: &str = "return=representation";

/// Fields of a remote error body that may carry the message, in priority order.
const MESSAGE_FIELDS: [&str; 4] = ["message", "msg", "error_description", "error"];

/// Client for the Supabase REST and auth APIs.
///
/// Cheap to clone; the inner `reqwest::Client` pools connections and is safe
/// to share across tasks.
#[derive(Clone)]
pub struct SupabaseClient {
    /// The underlying HTTP client.
    http_client: Client,

    /// The base URL of the Supabase project (e.g., `https://xxx.supabase.co`).
    base_url: String,

    /// API key sent as both `apikey` and bearer token.
    api_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SupabaseClient {
    /// Creates a new Supabase client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The Supabase project URL (e.g., `https://xxx.supabase.co`)
    /// * `api_key` - The project API key
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                GatewayError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    /// Returns the base URL of the Supabase project.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a request to `path` with the project credentials attached.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Starts a request against the events table.
    fn events(&self, method: Method) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{EVENTS_TABLE}"))
    }

    /// Sends a request, turning transport faults and non-success statuses
    /// into [`GatewayError`]s.
    async fn execute(&self, request: RequestBuilder) -> GatewayResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(REQUEST_TIMEOUT)
            } else if e.is_connect() {
                GatewayError::Unavailable(format!("connection failed: {e}"))
            } else {
                GatewayError::Unavailable(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = remote_message(&body)
                .unwrap_or_else(|| format!("remote request failed with status {status}"));
            warn!(status = %status, message = %message, "Supabase rejected request");
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Sends a request and decodes a JSON success body.
    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        self.execute(request)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl DataGateway for SupabaseClient {
    async fn list_events(&self) -> GatewayResult<Vec<Record>> {
        debug!("Listing events");
        let rows: Vec<Record> = self
            .execute_json(self.events(Method::GET).query(&[("select", "*")]))
            .await?;
        debug!(count = rows.len(), "Listed events");
        Ok(rows)
    }

    async fn insert_event(&self, record: Record) -> GatewayResult<Record> {
        let rows: Vec<Record> = self
            .execute_json(
                self.events(Method::POST)
                    .header("Prefer", PREFER_REPRESENTATION)
                    .json(&record),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            GatewayError::InvalidResponse("insert returned no rows".to_string())
        })
    }

    async fn update_event(&self, id: &str, changes: Record) -> GatewayResult<Vec<Record>> {
        debug!(event_id = %id, fields = changes.len(), "Updating event");
        self.execute_json(
            self.events(Method::PATCH)
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", PREFER_REPRESENTATION)
                .json(&changes),
        )
        .await
    }

    async fn delete_event(&self, id: &str) -> GatewayResult<()> {
        debug!(event_id = %id, "Deleting event");
        self.execute(
            self.events(Method::DELETE)
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;
        Ok(())
    }

    async fn sign_up(&self, request: &SignupRequest) -> GatewayResult<Value> {
        debug!(email = %request.email, "Signing up user");
        let mut metadata = Record::new();
        if let Some(full_name) = &request.full_name {
            metadata.insert("full_name".to_string(), Value::from(full_name.as_str()));
        }

        self.execute_json(self.request(Method::POST, "/auth/v1/signup").json(&json!({
            "email": request.email,
            "password": request.password,
            "data": metadata,
        })))
        .await
    }

    async fn sign_in(&self, request: &LoginRequest) -> GatewayResult<Value> {
        debug!(email = %request.email, "Signing in user");
        self.execute_json(
            self.request(Method::POST, "/auth/v1/token")
                .query(&[("grant_type", "password")])
                .json(&json!({
                    "email": request.email,
                    "password": request.password,
                })),
        )
        .await
    }
}

/// Extracts a human readable message from a remote error body.
///
/// PostgREST uses `message`, GoTrue uses `msg` or `error_description`
/// depending on the endpoint. Falls back to the raw body text.
fn remote_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        let message = MESSAGE_FIELDS
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .filter(|message| !message.is_empty());
        if let Some(message) = message {
            return Some(message.to_string());
        }
    }

    Some(body.to_string())
}
