//! Server configuration module.
//!
//! Parses configuration from environment variables for the UniNear server.
//! The binary loads a `.env` file (if present) before calling
//! [`Config::from_env`].
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `SUPABASE_URL` | Yes | - | URL of the Supabase project |
//! | `SUPABASE_KEY` | Yes | - | Supabase API key |
//! | `PORT` | No | 8000 | HTTP server port |
//! | `CORS_ALLOWED_ORIGINS` | No | `http://localhost:3000,http://127.0.0.1:3000` | Comma-separated origins, or `*` for any |

use std::env;
use std::fmt;

use thiserror::Error;

use crate::cors::CorsOrigins;

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 8000;

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },

    /// Port number is invalid.
    #[error("invalid port number: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Server configuration parsed from environment variables.
#[derive(Clone)]
pub struct Config {
    /// URL of the Supabase project (e.g., `https://xxx.supabase.co`).
    pub supabase_url: String,

    /// Supabase API key.
    pub supabase_key: String,

    /// HTTP server port.
    pub port: u16,

    /// Origins allowed to call the API from a browser.
    pub cors_origins: CorsOrigins,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `SUPABASE_URL` or `SUPABASE_KEY` is missing or blank
    /// - `SUPABASE_URL` is not an http(s) URL
    /// - `PORT` is not a valid u16
    ///
    /// # Example
    ///
    /// ```no_run
    /// use uninear_server::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Server will listen on port {}", config.port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = require_env("SUPABASE_URL")?;
        let supabase_key = require_env("SUPABASE_KEY")?;
        let port = parse_port()?;
        let cors_origins = CorsOrigins::parse(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let config = Self {
            supabase_url,
            supabase_key,
            port,
            cors_origins,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.supabase_url.starts_with("http://") || self.supabase_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidFormat {
                var: "SUPABASE_URL".to_string(),
                message: format!("expected an http(s) URL, got '{}'", self.supabase_url),
            });
        }

        Ok(())
    }
}

/// Reads a required variable, treating blank values as missing.
fn require_env(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

/// Parse the PORT environment variable.
///
/// Returns the default port if not set.
fn parse_port() -> Result<u16, ConfigError> {
    match env::var("PORT") {
        Ok(port_str) => Ok(port_str.trim().parse()?),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_PORT),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: "PORT".to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}
