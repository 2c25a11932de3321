// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Mailer Service
//!
//! Relays portfolio contact form submissions to the site owner by email.
//!
//! ## Routes
//!
//! - `POST /api/send-email`: submit `{name, email, message}`
//! - `OPTIONS /api/send-email`: preflight, answers `{}`
//! - `GET /health`, `GET /healthz`: liveness
//! - `GET /metrics`: Prometheus counters (unless disabled)
//!
//! ## Configuration
//!
//! Configuration is loaded once from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `SMTP_HOST`, `SMTP_USER`, `SMTP_PASS`, `SMTP_FROM`, `SMTP_TO`: required for delivery
//! - `SMTP_PORT`: SMTP port (default: 587)
//! - `APP_ENV`: `development` adds error details to failed-send responses
//! - `RATE_LIMIT_MAX`: Submissions per window per client (default: 3)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 3600)
//! - `CLEANUP_INTERVAL_SECS`: Expired window sweep interval (default: 60)
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_mailer::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    smtp::SmtpTransportFactory,
    validator::ContactValidator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        environment = ?config.environment,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        smtp_host = ?config.smtp.host,
        smtp_port = config.smtp.port,
        "Starting contact mailer"
    );

    let missing = config.smtp.missing_fields();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "SMTP configuration incomplete; submissions will be refused until it is set"
        );
    }

    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit.clone()),
        validator: ContactValidator::new(config.validation.clone())?,
        transports: Box::new(SmtpTransportFactory),
        metrics: Metrics::new()?,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
