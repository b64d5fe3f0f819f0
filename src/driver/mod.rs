// src/driver/mod.rs

//! Narrow page-automation capability interface.
//!
//! The matching and reservation logic only ever talks to these traits, so
//! it stays unit-testable without a real browser. The production
//! implementation lives in [`web`].

pub mod web;

#[cfg(test)]
pub mod fake;

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{AppError, Result};

/// How to locate elements on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
    Name(String),
    Id(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css '{}'", s),
            Self::XPath(s) => write!(f, "xpath '{}'", s),
            Self::Name(s) => write!(f, "name '{}'", s),
            Self::Id(s) => write!(f, "id '{}'", s),
        }
    }
}

/// The single timeout + poll-interval pair governing all element waits.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitPolicy {
    pub fn new(timeout_secs: u64, poll_ms: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            poll: Duration::from_millis(poll_ms),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(30, 500)
    }
}

/// A handle to one element on the current page.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Visible text content.
    async fn text(&self) -> Result<String>;

    /// Attribute value, if present.
    async fn attr(&self, name: &str) -> Result<Option<String>>;

    /// Native click.
    async fn click(&self) -> Result<()>;

    /// Scroll into view, then click via script.
    ///
    /// The target may be outside the viewport, where a native click's
    /// hit-test would fail.
    async fn scripted_click(&self) -> Result<()>;

    /// Whether a checkbox/radio element reports selected.
    async fn is_selected(&self) -> Result<bool>;

    /// `href` of the first anchor inside this element, if any.
    async fn link_href(&self) -> Result<Option<String>>;

    /// Type text into this element.
    async fn type_text(&self, text: &str) -> Result<()>;

    /// Send an Enter keypress to this element.
    async fn press_enter(&self) -> Result<()>;
}

/// A live browser page session.
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Elem: PageElement;

    /// Navigate to a URL and wait for the document load.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL of the current page.
    async fn current_url(&self) -> Result<String>;

    /// All elements matching the locator, in page order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Elem>>;

    /// Scroll the viewport to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Best-effort reset of cookies and web storage.
    async fn clear_session_state(&self) -> Result<()>;

    /// Tear down the browser session.
    async fn quit(&self) -> Result<()>;

    /// Poll until the locator matches at least one element.
    async fn wait_for(&self, locator: &Locator, wait: &WaitPolicy) -> Result<Self::Elem> {
        let deadline = Instant::now() + wait.timeout;
        loop {
            if let Some(elem) = self.find_all(locator).await?.into_iter().next() {
                return Ok(elem);
            }
            if Instant::now() >= deadline {
                return Err(AppError::WaitTimeout {
                    what: locator.to_string(),
                    timeout_secs: wait.timeout.as_secs(),
                });
            }
            tokio::time::sleep(wait.poll).await;
        }
    }

    /// Poll until any of the locators matches; returns the index of the
    /// first locator that produced an element.
    async fn wait_for_any(
        &self,
        locators: &[Locator],
        wait: &WaitPolicy,
    ) -> Result<(usize, Self::Elem)> {
        let deadline = Instant::now() + wait.timeout;
        loop {
            for (index, locator) in locators.iter().enumerate() {
                if let Some(elem) = self.find_all(locator).await?.into_iter().next() {
                    return Ok((index, elem));
                }
            }
            if Instant::now() >= deadline {
                let described: Vec<String> =
                    locators.iter().map(|l| l.to_string()).collect();
                return Err(AppError::WaitTimeout {
                    what: described.join(" or "),
                    timeout_secs: wait.timeout.as_secs(),
                });
            }
            tokio::time::sleep(wait.poll).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::css(".planner-entry").to_string(), "css '.planner-entry'");
        assert_eq!(Locator::name("username").to_string(), "name 'username'");
    }

    #[test]
    fn test_wait_policy_default() {
        let wait = WaitPolicy::default();
        assert_eq!(wait.timeout, Duration::from_secs(30));
        assert_eq!(wait.poll, Duration::from_millis(500));
    }
}
