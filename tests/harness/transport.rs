// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Recording transport used instead of SMTP.

use async_trait::async_trait;
use contact_mailer::mailer::{
    DeliveryConfig, MailError, MailTransport, OutboundMessage, TransportFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Factory that counts connections and records sent messages.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    fail_verify: bool,
    connections: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl RecordingFactory {
    /// Transports whose connection check fails.
    pub fn failing_verify() -> Self {
        Self {
            fail_verify: true,
            ..Default::default()
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl TransportFactory for RecordingFactory {
    fn connect(&self, _config: &DeliveryConfig) -> Result<Box<dyn MailTransport>, MailError> {
        let id = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(RecordingTransport {
            id,
            fail_verify: self.fail_verify,
            sent: Arc::clone(&self.sent),
        }))
    }
}

struct RecordingTransport {
    id: usize,
    fail_verify: bool,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn verify(&self) -> Result<(), MailError> {
        if self.fail_verify {
            return Err(MailError::VerifyFailed);
        }
        Ok(())
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String, MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(format!("<stub-{}@example.com>", self.id))
    }
}
