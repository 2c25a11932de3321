// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Mailer
//!
//! Backend for the portfolio contact form. A single endpoint accepts
//! `{name, email, message}` and relays it to the site owner by email:
//!
//! - Fixed-window rate limiting per client address (3 per hour default)
//! - Presence, email format and length validation
//! - Plaintext + HTML notification with the visitor as Reply-To
//! - SMTP delivery with a connection check before sending

pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod smtp;
pub mod validator;

pub use config::Config;
pub use error::ContactError;
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{MailTransport, OutboundMessage, TransportFactory};
pub use validator::{ContactValidator, Submission, ValidationResult};
