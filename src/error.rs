// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for contact submissions and their HTTP mapping.

use crate::mailer::MailError;
use crate::metrics::Outcome;
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a submission did not result in a sent email.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email service is not configured.")]
    NotConfigured { missing: Vec<&'static str> },

    #[error("Failed to send message. Please try again later.")]
    Delivery(#[from] MailError),

    /// The request body could not be read as a submission.
    #[error("Failed to send message. Please try again later.")]
    UnreadableBody { reason: String },
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured { .. } | Self::Delivery(_) | Self::UnreadableBody { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::RateLimited { .. } => Outcome::RateLimited,
            Self::Validation(_) => Outcome::Invalid,
            Self::NotConfigured { .. } => Outcome::NotConfigured,
            Self::Delivery(_) | Self::UnreadableBody { .. } => Outcome::DeliveryFailed,
        }
    }

    /// Build the JSON response. Generic failures carry the underlying
    /// error text only when `expose_details` is set.
    pub fn into_response_with(self, expose_details: bool) -> Response {
        let status = self.status();
        let details = match &self {
            Self::Delivery(err) if expose_details => Some(err.to_string()),
            Self::UnreadableBody { reason } if expose_details => Some(reason.clone()),
            _ => None,
        };
        let retry_after = match &self {
            Self::RateLimited { retry_after } => Some(retry_after.as_secs().max(1)),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            details,
        });

        match retry_after {
            Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
