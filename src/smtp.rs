// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SMTP delivery over `lettre`.
//!
//! Connections use opportunistic STARTTLS, which suits the submission port
//! (587). A transport is built per delivery and dropped afterwards.

use crate::mailer::{DeliveryConfig, MailError, MailTransport, OutboundMessage, TransportFactory};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use uuid::Uuid;

/// Builds authenticated SMTP transports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpTransportFactory;

impl TransportFactory for SmtpTransportFactory {
    fn connect(&self, config: &DeliveryConfig) -> Result<Box<dyn MailTransport>, MailError> {
        let tls = TlsParameters::new(config.host.clone())?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            .port(config.port)
            .tls(Tls::Opportunistic(tls))
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();

        debug!(host = %config.host, port = config.port, "SMTP transport created");

        Ok(Box::new(SmtpMailTransport {
            transport,
            id_domain: message_id_domain(&config.from).to_string(),
        }))
    }
}

/// One SMTP connection configuration.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    id_domain: String,
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn verify(&self) -> Result<(), MailError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailError::VerifyFailed)
        }
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String, MailError> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.id_domain);
        let email = to_lettre(message, &message_id)?;

        let response = self.transport.send(email).await?;
        debug!(
            code = %response.code(),
            message_id = %message_id,
            "SMTP server accepted message"
        );

        Ok(message_id)
    }
}

fn to_lettre(message: &OutboundMessage, message_id: &str) -> Result<Message, MailError> {
    let from = Mailbox::new(Some(message.from_name.clone()), message.from.parse()?);

    let email = Message::builder()
        .message_id(Some(message_id.to_string()))
        .from(from)
        .to(message.to.parse()?)
        .reply_to(message.reply_to.parse()?)
        .subject(message.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            message.text_body.clone(),
            message.html_body.clone(),
        ))?;

    Ok(email)
}

/// Domain part of the sender address, used for generated Message-IDs.
fn message_id_domain(from: &str) -> &str {
    match from.rsplit_once('@') {
        Some((_, domain)) if !domain.is_empty() => domain,
        _ => "localhost",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn outbound(reply_to: &str) -> OutboundMessage {
        OutboundMessage {
            from_name: "Portfolio Contact".to_string(),
            from: "noreply@example.com".to_string(),
            to: "owner@example.com".to_string(),
            reply_to: reply_to.to_string(),
            subject: "New Portfolio Message from Ada".to_string(),
            text_body: "Hello".to_string(),
            html_body: "<p>Hello</p>".to_string(),
        }
    }

    #[test]
    fn test_message_id_domain() {
        assert_eq!(message_id_domain("noreply@example.com"), "example.com");
        assert_eq!(message_id_domain("noreply@"), "localhost");
        assert_eq!(message_id_domain("noreply"), "localhost");
    }

    #[test]
    fn test_lettre_message_headers() {
        let email = assert_ok!(to_lettre(&outbound("ada@example.org"), "<id-1@example.com>"));
        let formatted = String::from_utf8_lossy(&email.formatted()).to_string();

        assert!(formatted.contains("Reply-To: ada@example.org"));
        assert!(formatted.contains("To: owner@example.com"));
        assert!(formatted.contains("Message-ID: <id-1@example.com>"));
        assert!(formatted.contains("multipart/alternative"));
    }

    #[test]
    fn test_unparseable_reply_to_is_an_address_error() {
        let result = to_lettre(&outbound("no-at-sign"), "<id-2@example.com>");
        assert!(matches!(assert_err!(result), MailError::Address(_)));
    }
}
