// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification email composition and the delivery seam.
//!
//! A [`TransportFactory`] builds a fresh [`MailTransport`] for every
//! submission. The SMTP implementation lives in [`crate::smtp`]; tests plug
//! in a recording stub.

use crate::config::SmtpConfig;
use crate::validator::Submission;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use thiserror::Error;

/// Display name used on the `From` header.
pub const SENDER_NAME: &str = "Portfolio Contact";

/// Errors raised while building or delivering a message.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("SMTP server did not accept the connection check")]
    VerifyFailed,
}

/// Resolved SMTP settings; every required field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl DeliveryConfig {
    /// Resolve raw settings, or return the names of the missing ones.
    pub fn resolve(smtp: &SmtpConfig) -> Result<Self, Vec<&'static str>> {
        let missing = smtp.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }

        let take = |value: &Option<String>| value.clone().unwrap_or_default();
        Ok(Self {
            host: take(&smtp.host),
            port: smtp.port,
            user: take(&smtp.user),
            password: take(&smtp.password),
            from: take(&smtp.from),
            to: take(&smtp.to),
        })
    }
}

/// A fully composed notification, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from_name: String,
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Delivers composed messages.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Check that the server is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), MailError>;

    /// Send the message and return its identifier.
    async fn send(&self, message: &OutboundMessage) -> Result<String, MailError>;
}

/// Builds a transport for one delivery.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, config: &DeliveryConfig) -> Result<Box<dyn MailTransport>, MailError>;
}

/// Compose the notification for a validated submission.
pub fn compose(
    submission: &Submission,
    delivery: &DeliveryConfig,
    client: &str,
    received_at: DateTime<Utc>,
) -> OutboundMessage {
    let timestamp = received_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    OutboundMessage {
        from_name: SENDER_NAME.to_string(),
        from: delivery.from.clone(),
        to: delivery.to.clone(),
        reply_to: submission.email.clone(),
        subject: format!("New Portfolio Message from {}", submission.name),
        text_body: render_text(submission, client, &timestamp),
        html_body: render_html(submission, client, received_at, &timestamp),
    }
}

fn render_text(submission: &Submission, client: &str, timestamp: &str) -> String {
    format!(
        "Name: {name}\n\
         Email: {email}\n\
         \n\
         Message:\n\
         {message}\n\
         \n\
         ---\n\
         Sent from your portfolio contact form\n\
         IP: {client}\n\
         Time: {timestamp}",
        name = submission.name,
        email = submission.email,
        message = submission.message,
    )
}

fn render_html(
    submission: &Submission,
    client: &str,
    received_at: DateTime<Utc>,
    timestamp: &str,
) -> String {
    let name = encode_text(&submission.name);
    let email = encode_text(&submission.email);
    let email_attr = encode_double_quoted_attribute(&submission.email);
    let message = encode_text(&submission.message);
    let first_name = submission.name.split(' ').next().unwrap_or_default();
    let first_name = encode_text(first_name);
    let client = encode_text(client);
    let date = received_at.format("%A, %B %-d, %Y, %H:%M UTC");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    body {{ font-family: -apple-system, 'Segoe UI', Arial, sans-serif; line-height: 1.6; background: #f5f5f7; padding: 40px 20px; }}
    .container {{ max-width: 680px; margin: 0 auto; background: #ffffff; border-radius: 12px; overflow: hidden; }}
    .header {{ background: #000000; color: #ffffff; padding: 40px; text-align: center; }}
    .content {{ padding: 40px; color: #1d1d1f; }}
    .label {{ font-size: 13px; font-weight: 600; color: #86868b; text-transform: uppercase; }}
    .message {{ background: #f5f5f7; border: 1px solid #e5e5e7; border-radius: 8px; padding: 24px; white-space: pre-wrap; word-wrap: break-word; }}
    .reply {{ display: inline-block; padding: 14px 32px; background: #000000; color: #ffffff; text-decoration: none; border-radius: 8px; }}
    .footer {{ background: #f5f5f7; padding: 32px 40px; font-size: 13px; color: #86868b; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>New Contact Request</h1>
      <p>Portfolio Website Inquiry</p>
    </div>
    <div class="content">
      <p>You have received a new message from your portfolio contact form.</p>
      <p><span class="label">From</span><br>{name}</p>
      <p><span class="label">Email</span><br><a href="mailto:{email_attr}">{email}</a></p>
      <p><span class="label">Date</span><br>{date}</p>
      <p class="label">Message</p>
      <div class="message">{message}</div>
      <p style="text-align: center; margin: 40px 0;">
        <a class="reply" href="mailto:{email_attr}?subject=Re: Portfolio Inquiry">Reply to {first_name}</a>
      </p>
    </div>
    <div class="footer">
      <div>Source: Portfolio Contact Form</div>
      <div>IP Address: {client}</div>
      <div>Timestamp: {timestamp}</div>
      <p>This is an automated message from your portfolio website.</p>
    </div>
  </div>
</body>
</html>"#
    )
}
