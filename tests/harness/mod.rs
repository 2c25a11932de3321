// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for driving the contact mailer router in-process.
//!
//! Provides a recording transport in place of SMTP and helpers for building
//! requests and reading JSON responses.

#![allow(dead_code)]

pub mod transport;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use contact_mailer::{
    config::{Config, Environment, SmtpConfig},
    handlers::{router, AppState},
    limiter::RateLimiter,
    metrics::Metrics,
    validator::ContactValidator,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use transport::RecordingFactory;

/// A router wired to a recording transport.
pub struct TestApp {
    pub router: Router,
    pub transports: RecordingFactory,
}

impl TestApp {
    pub fn new(config: Config) -> Self {
        Self::with_transports(config, RecordingFactory::default())
    }

    pub fn with_transports(config: Config, transports: RecordingFactory) -> Self {
        let state = Arc::new(AppState {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            validator: ContactValidator::new(config.validation.clone()).unwrap(),
            transports: Box::new(transports.clone()),
            metrics: Metrics::new().unwrap(),
            config,
        });

        Self {
            router: router(state),
            transports,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }

    pub async fn submit(&self, client: &str, body: Value) -> (StatusCode, Value) {
        self.send(submission_request(client, body)).await
    }
}

/// Configuration with complete SMTP settings.
pub fn configured() -> Config {
    Config {
        smtp: SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            user: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            from: Some("noreply@example.com".to_string()),
            to: Some("owner@example.com".to_string()),
        },
        ..Default::default()
    }
}

pub fn development(mut config: Config) -> Config {
    config.environment = Environment::Development;
    config
}

pub fn valid_body() -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "ada@example.org",
        "message": "I would like to talk about a project.",
    })
}

pub fn submission_request(client: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/send-email")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
