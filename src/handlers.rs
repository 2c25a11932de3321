// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact mailer service.

use crate::config::Config;
use crate::error::ContactError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::{compose, DeliveryConfig, MailError, TransportFactory};
use crate::metrics::{Metrics, Outcome};
use crate::validator::{ContactValidator, Submission, ValidationResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Route the contact form posts to.
pub const SEND_EMAIL_PATH: &str = "/api/send-email";

/// Client key used when no forwarding header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: ContactValidator,
    pub transports: Box<dyn TransportFactory>,
    pub metrics: Metrics,
    pub config: Config,
}

/// Successful submission body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(SEND_EMAIL_PATH, post(submit).options(preflight));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-mailer",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// CORS preflight: an empty JSON object plus the headers a browser needs
/// to follow up with the POST.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        Json(serde_json::json!({})),
    )
}

/// Prometheus exposition endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accept a contact form submission and forward it by email.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Submission>, JsonRejection>,
) -> Response {
    let client = client_address(&headers);

    match process(&state, &client, body).await {
        Ok(sent) => {
            state.metrics.record(Outcome::Sent);
            info!(client = %client, message_id = %sent.message_id, "Email sent successfully");
            (StatusCode::OK, Json(sent)).into_response()
        }
        Err(err) => {
            state.metrics.record(err.outcome());
            err.into_response_with(state.config.environment.is_development())
        }
    }
}

async fn process(
    state: &AppState,
    client: &str,
    body: Result<Json<Submission>, JsonRejection>,
) -> Result<SendResponse, ContactError> {
    if let RateLimitResult::Limited { retry_after } = state.limiter.check(client).await {
        info!(
            client = %client,
            retry_after_secs = retry_after.as_secs(),
            "Submission rate limited"
        );
        return Err(ContactError::RateLimited { retry_after });
    }

    let Json(submission) = body.map_err(|rejection| {
        error!(client = %client, error = %rejection, "Unreadable submission body");
        ContactError::UnreadableBody {
            reason: rejection.body_text(),
        }
    })?;

    if let ValidationResult::Invalid(err) = state.validator.validate(&submission) {
        info!(client = %client, error = %err, "Submission failed validation");
        return Err(err.into());
    }

    let delivery = DeliveryConfig::resolve(&state.config.smtp).map_err(|missing| {
        error!(missing = ?missing, "Missing SMTP configuration");
        ContactError::NotConfigured { missing }
    })?;

    let message_id = deliver(state, &delivery, &submission, client)
        .await
        .map_err(|err| {
            error!(client = %client, error = %err, "Email sending error");
            ContactError::Delivery(err)
        })?;

    Ok(SendResponse {
        success: true,
        message: "Message sent successfully!",
        message_id,
    })
}

/// Connect and verify the transport, then compose and send the message.
async fn deliver(
    state: &AppState,
    delivery: &DeliveryConfig,
    submission: &Submission,
    client: &str,
) -> Result<String, MailError> {
    let transport = state.transports.connect(delivery)?;
    transport.verify().await?;

    let message = compose(submission, delivery, client, Utc::now());
    transport.send(&message).await
}

/// Client key for rate limiting: `x-forwarded-for`, then `x-real-ip`,
/// then [`UNKNOWN_CLIENT`]. Header values are taken verbatim.
pub fn client_address(headers: &HeaderMap) -> String {
    ["x-forwarded-for", "x-real-ip"]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| match value.to_str() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring non-ASCII forwarding header");
                None
            }
        })
        .find(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
