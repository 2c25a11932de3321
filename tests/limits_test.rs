// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Rate limit behaviour of the contact endpoint over time.

mod harness;

use axum::http::StatusCode;
use contact_mailer::{
    config::RateLimitConfig,
    limiter::{RateLimitResult, RateLimiter},
};
use harness::{configured, submission_request, valid_body, TestApp};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test(start_paused = true)]
async fn test_fourth_submission_within_hour_is_limited() {
    let app = TestApp::new(configured());

    for i in 0..3 {
        let (status, _) = app.submit("192.0.2.1", valid_body()).await;
        assert_eq!(status, StatusCode::OK, "submission {} should pass", i + 1);
    }

    let (status, body) = app.submit("192.0.2.1", valid_body()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({ "error": "Too many requests. Please try again later." })
    );
    assert_eq!(app.transports.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_window_resets_after_an_hour() {
    let app = TestApp::new(configured());

    for _ in 0..3 {
        app.submit("192.0.2.2", valid_body()).await;
    }
    let (status, _) = app.submit("192.0.2.2", valid_body()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::advance(Duration::from_secs(3601)).await;

    let (status, _) = app.submit("192.0.2.2", valid_body()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_header_reports_remaining_window() {
    let app = TestApp::new(configured());
    for _ in 0..3 {
        app.submit("192.0.2.3", valid_body()).await;
    }

    tokio::time::advance(Duration::from_secs(600)).await;

    let response = app
        .router
        .clone()
        .oneshot(submission_request("192.0.2.3", valid_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "3000");
}

#[tokio::test(start_paused = true)]
async fn test_invalid_submissions_still_count_against_limit() {
    let app = TestApp::new(configured());
    let invalid = json!({ "name": "", "email": "a@b.com", "message": "hi" });

    for _ in 0..3 {
        let (status, _) = app.submit("192.0.2.4", invalid.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app.submit("192.0.2.4", valid_body()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.transports.connections(), 0);
}

#[tokio::test]
async fn test_concurrent_checks_never_exceed_limit() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        max_requests: 3,
        ..Default::default()
    }));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.check("192.0.2.5").await })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if let RateLimitResult::Allowed { .. } = handle.await.unwrap() {
            allowed += 1;
        }
    }

    assert_eq!(allowed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_bounds_tracked_clients() {
    let limiter = RateLimiter::new(RateLimitConfig::default());

    for i in 0..50 {
        limiter.check(&format!("192.0.2.{i}")).await;
    }
    assert_eq!(limiter.tracked_keys().await, 50);

    tokio::time::advance(Duration::from_secs(3601)).await;
    assert_eq!(limiter.cleanup().await, 50);
    assert_eq!(limiter.tracked_keys().await, 0);
}
