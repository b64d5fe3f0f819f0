// src/notify/email.rs

//! SMTP email transport.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::error::{AppError, Result};

/// Sends plain-text mail through an SMTP server with STARTTLS + login.
#[derive(Clone)]
pub struct EmailSender {
    config: EmailConfig,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send to the configured receiver.
    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let receiver = self.config.receiver.clone();
        self.send_to(&receiver, subject, body).await
    }

    /// Send to an explicit recipient (used by the SMS gateway path).
    pub async fn send_to(&self, receiver: &str, subject: &str, body: &str) -> Result<()> {
        if !self.config.is_configured() {
            return Err(AppError::notification("email configuration is incomplete"));
        }

        let message = Message::builder()
            .from(self.config.sender.parse()?)
            .to(receiver.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let credentials = Credentials::new(
            self.config.sender.clone(),
            self.config.password.clone(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}
