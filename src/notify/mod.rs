// src/notify/mod.rs

//! Notification gateway.
//!
//! Dispatches a subject + body through the configured transport. Delivery
//! is best-effort and fire-and-forget: failures are logged and reported as
//! `false`, never escalated, and a failed notification never fails the
//! booking outcome itself.

pub mod email;
pub mod sms;
pub mod telegram;

use async_trait::async_trait;

use crate::config::{BotConfig, NotificationMethod};

pub use email::EmailSender;
pub use sms::SmsSender;
pub use telegram::TelegramSender;

/// Anything that can deliver a notification.
///
/// The reservation flow and retry loop only depend on this trait, so tests
/// can count emissions without touching a transport.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Returns true when at least one transport delivered the message.
    async fn send(&self, subject: &str, body: &str) -> bool;
}

/// Transport dispatcher over the configured notification method.
pub struct Notifier {
    method: NotificationMethod,
    email: EmailSender,
    sms: SmsSender,
    telegram: TelegramSender,
}

impl Notifier {
    pub fn new(config: &BotConfig) -> Self {
        let email = EmailSender::new(config.email.clone());
        Self {
            method: config.notification_method,
            sms: SmsSender::new(config.sms.clone(), email.clone()),
            telegram: TelegramSender::new(config.telegram.clone()),
            email,
        }
    }

    async fn send_email(&self, subject: &str, body: &str) -> bool {
        match self.email.send(subject, body).await {
            Ok(()) => {
                log::info!("Notification sent via email: {}", subject);
                true
            }
            Err(e) => {
                log::warn!("Failed to send email notification: {}", e);
                false
            }
        }
    }

    async fn send_sms(&self, subject: &str, body: &str) -> bool {
        match self.sms.send(subject, body).await {
            Ok(()) => {
                log::info!("Notification sent via SMS: {}", subject);
                true
            }
            Err(e) => {
                log::warn!("Failed to send SMS notification: {}", e);
                false
            }
        }
    }

    async fn send_telegram(&self, subject: &str, body: &str) -> bool {
        match self.telegram.send(subject, body).await {
            Ok(()) => {
                log::info!("Notification sent via Telegram: {}", subject);
                true
            }
            Err(e) => {
                log::warn!("Failed to send Telegram notification: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    async fn send(&self, subject: &str, body: &str) -> bool {
        match self.method {
            NotificationMethod::Email => self.send_email(subject, body).await,
            NotificationMethod::Sms => self.send_sms(subject, body).await,
            NotificationMethod::Telegram => self.send_telegram(subject, body).await,
            NotificationMethod::Both => {
                // Attempted independently; one failing must not abort the other.
                let email_ok = self.send_email(subject, body).await;
                let sms_ok = self.send_sms(subject, body).await;
                if !email_ok && !sms_ok {
                    log::warn!("All notification methods failed");
                }
                email_ok || sms_ok
            }
        }
    }
}

#[cfg(test)]
pub mod recording {
    //! Recording sink for tests.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::NotificationSink;

    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn subjects(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(subject, _)| subject.clone())
                .collect()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, subject: &str, body: &str) -> bool {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            true
        }
    }
}
