// src/notify/telegram.rs

//! Telegram bot API transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::error::{AppError, Result};

/// Form payload for the `sendMessage` endpoint.
#[derive(Debug, Serialize, PartialEq)]
pub struct SendMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: &'static str,
}

impl SendMessage {
    /// HTML-formatted message: bold subject, body on the next line.
    pub fn new(chat_id: &str, subject: &str, body: &str) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            text: format!("<b>{}</b>\n{}", subject, body),
            parse_mode: "HTML",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Posts notifications to a Telegram chat via the bot API.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self { config, client }
    }

    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        if !self.config.is_configured() {
            return Err(AppError::notification(
                "telegram configuration is incomplete",
            ));
        }

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.token
        );
        let payload = SendMessage::new(&self.config.chat_id, subject, body);

        let response: ApiResponse = self
            .client
            .post(&url)
            .form(&payload)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(AppError::notification(format!(
                "telegram API rejected message: {}",
                response.description.unwrap_or_else(|| "unknown".into())
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_html_with_bold_subject() {
        let payload = SendMessage::new("42", "Lifetime Bot - Success", "Booked!");
        assert_eq!(payload.chat_id, "42");
        assert_eq!(payload.text, "<b>Lifetime Bot - Success</b>\nBooked!");
        assert_eq!(payload.parse_mode, "HTML");
    }

    #[tokio::test]
    async fn test_unconfigured_telegram_is_rejected_without_sending() {
        let sender = TelegramSender::new(TelegramConfig {
            token: String::new(),
            chat_id: String::new(),
        });
        assert!(matches!(
            sender.send("subject", "body").await,
            Err(AppError::Notification(_))
        ));
    }
}
