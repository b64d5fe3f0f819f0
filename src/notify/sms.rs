// src/notify/sms.rs

//! SMS delivery through a carrier email-to-SMS gateway.

use crate::config::SmsConfig;
use crate::error::Result;

use super::email::EmailSender;

/// Relays a message to a phone by mailing the carrier's gateway address.
pub struct SmsSender {
    config: SmsConfig,
    email: EmailSender,
}

impl SmsSender {
    pub fn new(config: SmsConfig, email: EmailSender) -> Self {
        Self { config, email }
    }

    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        // Unknown carrier is a configuration error; nothing is sent.
        let gateway = self.config.gateway_address()?;
        self.email.send_to(&gateway, subject, body).await
    }
}
