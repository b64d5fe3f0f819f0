// src/error.rs

//! Unified error handling for the reservation bot.

use std::fmt;

use thiserror::Error;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebDriver command failed
    #[error("WebDriver error: {0}")]
    Driver(#[from] thirtyfour::error::WebDriverError),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SMTP delivery failed
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Email message construction failed
    #[error("Email build error: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    /// Email address parsing failed
    #[error("Email address error: {0}")]
    EmailAddress(#[from] lettre::address::AddressError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error (fatal, aborts before any browser work)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Schedule page failed to render expected markers
    #[error("Navigation error for {context}: {message}")]
    Navigation { context: String, message: String },

    /// No schedule card matched the target class
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// A reservation step threw or timed out
    #[error("Reservation step '{step}' failed: {message}")]
    ReservationStep { step: String, message: String },

    /// No reserve/waitlist/cancel button on the detail page
    #[error("No actionable button found on class detail page")]
    NoActionableButton,

    /// Element wait exceeded its timeout
    #[error("Timed out after {timeout_secs}s waiting for {what}")]
    WaitTimeout { what: String, timeout_secs: u64 },

    /// Notification transport failure (logged and swallowed, never escalated)
    #[error("Notification error: {0}")]
    Notification(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a navigation error with context.
    pub fn navigation(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Navigation {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a reservation step error.
    pub fn step(step: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ReservationStep {
            step: step.into(),
            message: message.to_string(),
        }
    }

    /// Create a notification error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }

    /// Whether this error is fatal (no retry) rather than attempt-level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_))
    }
}
