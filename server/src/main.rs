//! UniNear Server - Main entry point.
//!
//! This binary starts the UniNear events API with:
//! - `.env` loading for local development
//! - Structured JSON logging
//! - Graceful shutdown handling (SIGTERM/SIGINT)
//!
//! # Configuration
//!
//! See [`uninear_server::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! SUPABASE_URL="https://xyz.supabase.co" \
//! SUPABASE_KEY="anon-key" \
//! PORT=8000 \
//! cargo run --release --bin uninear-server
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use uninear_server::config::Config;
use uninear_server::routes::{create_router, AppState};
use uninear_server::supabase::SupabaseClient;

#[tokio::main]
async fn main() -> ExitCode {
    // Values already in the environment win over the file
    let dotenv = dotenvy::dotenv();

    init_logging();

    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Required environment variables:");
            eprintln!("  SUPABASE_URL           - URL of the Supabase project");
            eprintln!("  SUPABASE_KEY           - Supabase API key");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  PORT                   - HTTP server port (default: 8000)");
            eprintln!("  CORS_ALLOWED_ORIGINS   - Comma-separated origins, or '*' (default: localhost:3000)");
            eprintln!("  RUST_LOG               - Log level filter (default: info)");
            return ExitCode::from(1);
        }
    };

    let gateway = match SupabaseClient::new(&config.supabase_url, &config.supabase_key) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "Failed to create Supabase client");
            return ExitCode::from(1);
        }
    };

    info!(
        port = config.port,
        supabase_url = %config.supabase_url,
        "UniNear server starting"
    );

    let state = AppState::new(config.clone(), Arc::new(gateway));
    let app = create_router(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => {
            info!(
                port = config.port,
                address = %bind_addr,
                "Server listening"
            );
            listener
        }
        Err(err) => {
            error!(
                error = %err,
                address = %bind_addr,
                "Failed to bind to address"
            );
            return ExitCode::from(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    info!("Server ready to accept connections");

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        return ExitCode::from(1);
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Initialize structured logging with tracing.
///
/// Uses `RUST_LOG` when set, otherwise `info` with request-level tracing
/// from `tower_http`.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .init();
}

/// Resolves when SIGINT or SIGTERM is received.
///
/// If a handler cannot be installed the corresponding branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
