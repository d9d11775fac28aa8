//! CORS configuration.
//!
//! Browsers call the API from the campus web and mobile frontends, so the
//! allowed origins come from configuration rather than being hardcoded.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

/// How long browsers may cache a preflight response.
const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

/// Which origins may make credentialed cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin. The request origin is mirrored back so credentials still
    /// work.
    Any,
    /// Only the listed origins.
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parses a comma-separated origin list.
    ///
    /// `*` anywhere in the list selects [`CorsOrigins::Any`]. Entries that are
    /// not valid header values are skipped; if nothing valid remains the
    /// permissive mode is used.
    pub fn parse(origins: &str) -> Self {
        let mut allowed = Vec::new();

        for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            if origin == "*" {
                info!("CORS: all origins allowed");
                return Self::Any;
            }

            match origin.parse::<HeaderValue>() {
                Ok(value) => {
                    debug!(origin = %origin, "CORS: allowing origin");
                    allowed.push(value);
                }
                Err(err) => {
                    warn!(origin = %origin, error = %err, "CORS: skipping invalid origin");
                }
            }
        }

        if allowed.is_empty() {
            warn!("CORS: no valid origins configured, allowing all origins");
            Self::Any
        } else {
            info!(count = allowed.len(), "CORS: configured allowed origins");
            Self::List(allowed)
        }
    }
}

/// Builds the CORS layer applied to every route.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::mirror_request(),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ALLOWED_ORIGINS;

    #[test]
    fn parses_default_origins() {
        let origins = CorsOrigins::parse(DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(
            origins,
            CorsOrigins::List(vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ])
        );
    }

    #[test]
    fn wildcard_allows_any() {
        assert_eq!(CorsOrigins::parse("*"), CorsOrigins::Any);
        assert_eq!(
            CorsOrigins::parse("http://localhost:3000, *"),
            CorsOrigins::Any
        );
    }

    #[test]
    fn trims_and_skips_blank_entries() {
        let origins = CorsOrigins::parse(" https://uninear.app , ,");
        assert_eq!(
            origins,
            CorsOrigins::List(vec![HeaderValue::from_static("https://uninear.app")])
        );
    }

    #[test]
    fn empty_list_falls_back_to_any() {
        assert_eq!(CorsOrigins::parse(""), CorsOrigins::Any);
        assert_eq!(CorsOrigins::parse("bad\norigin"), CorsOrigins::Any);
    }

    #[test]
    fn builds_layer_for_both_modes() {
        let _ = cors_layer(&CorsOrigins::Any);
        let _ = cors_layer(&CorsOrigins::parse(DEFAULT_ALLOWED_ORIGINS));
    }
}
