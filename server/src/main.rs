//! Relay Server - Main entry point.
//!
//! This binary starts the relay server with:
//! - Structured JSON logging for production (`RELAY_LOG_FORMAT=pretty` for
//!   local development)
//! - Graceful shutdown handling (SIGTERM/SIGINT)
//!
//! # Configuration
//!
//! See [`relay_server::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! # Generate a secret first: cargo run --bin generate-token
//! RELAY_SECRET_TOKEN="your-generated-secret" \
//! PORT=8080 \
//! cargo run --release --bin relay-server
//! ```

use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use relay_server::config::{Config, LogFormat};
use relay_server::routes::{create_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration before logging is up; failures go to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Required environment variables:");
            eprintln!("  RELAY_SECRET_TOKEN           - Shared secret (min 8 chars; see generate-token)");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  HOST                         - Bind address (default: 0.0.0.0)");
            eprintln!("  PORT                         - Bind port (default: 8080)");
            eprintln!("  RELAY_MAX_MESSAGE_LENGTH     - Max chat text length (default: 500)");
            eprintln!("  RELAY_MAX_CONNECTIONS        - Advertised connection bound (default: 100)");
            eprintln!("  RELAY_RATE_LIMIT_PER_MINUTE  - Configured rate limit value (default: 60)");
            eprintln!("  RELAY_LOG_FORMAT             - Log format: json or pretty (default: json)");
            eprintln!("  RUST_LOG                     - Log level filter (default: info)");
            return ExitCode::from(1);
        }
    };

    init_logging(config.log_format);

    info!(
        host = %config.host,
        port = config.port,
        max_message_length = config.max_message_length,
        max_connections = config.max_connections,
        "Relay server starting"
    );

    let state = AppState::new(config.clone());
    let app = create_router(state);

    let bind_addr = config.bind_addr();
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => {
            info!(address = %bind_addr, "Server listening");
            listener
        }
        Err(err) => {
            error!(error = %err, address = %bind_addr, "Failed to bind to address");
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
/// Log level filtering comes from RUST_LOG, defaulting to `info`. Output is
/// JSON by default; `RELAY_LOG_FORMAT=pretty` selects human-readable output.
fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_file(false)
                .with_line_number(false);
            registry.with(json_layer).init();
        }
        LogFormat::Pretty => {
            registry.with(fmt::layer()).init();
        }
    }
}

/// Creates a future that resolves when a shutdown signal is received.
///
/// Listens for:
/// - SIGTERM (container orchestrator shutdown)
/// - SIGINT (Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
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
