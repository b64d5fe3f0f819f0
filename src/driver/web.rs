// src/driver/web.rs

//! WebDriver-backed implementation of the page-automation traits.

use async_trait::async_trait;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, Key, WebDriver, WebElement};

use crate::config::BrowserConfig;
use crate::error::Result;

use super::{Locator, PageDriver, PageElement};

/// One browser session against a WebDriver endpoint.
pub struct WebSession {
    driver: WebDriver,
}

impl WebSession {
    /// Start a Chrome session against the configured endpoint.
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--window-size=1920,1080")?;
        if config.headless {
            caps.add_arg("--headless=new")?;
        }

        let driver = WebDriver::new(&config.webdriver_url, caps).await?;
        Ok(Self { driver })
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Css(s) => By::Css(s.as_str()),
        Locator::XPath(s) => By::XPath(s.as_str()),
        Locator::Name(s) => By::Name(s.as_str()),
        Locator::Id(s) => By::Id(s.as_str()),
    }
}

/// Element handle paired with its owning session for scripted actions.
pub struct WebPageElement {
    elem: WebElement,
    driver: WebDriver,
}

#[async_trait]
impl PageElement for WebPageElement {
    async fn text(&self) -> Result<String> {
        Ok(self.elem.text().await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>> {
        Ok(self.elem.attr(name).await?)
    }

    async fn click(&self) -> Result<()> {
        Ok(self.elem.click().await?)
    }

    async fn scripted_click(&self) -> Result<()> {
        self.elem.scroll_into_view().await?;
        self.driver
            .execute("arguments[0].click();", vec![self.elem.to_json()?])
            .await?;
        Ok(())
    }

    async fn is_selected(&self) -> Result<bool> {
        Ok(self.elem.is_selected().await?)
    }

    async fn link_href(&self) -> Result<Option<String>> {
        let anchors = self.elem.find_all(By::Tag("a")).await?;
        match anchors.into_iter().next() {
            Some(anchor) => Ok(anchor.attr("href").await?),
            None => Ok(None),
        }
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        Ok(self.elem.send_keys(text).await?)
    }

    async fn press_enter(&self) -> Result<()> {
        Ok(self.elem.send_keys(Key::Enter + "").await?)
    }
}

#[async_trait]
impl PageDriver for WebSession {
    type Elem = WebPageElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        Ok(self.driver.goto(url).await?)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Elem>> {
        let elems = self.driver.find_all(to_by(locator)).await?;
        Ok(elems
            .into_iter()
            .map(|elem| WebPageElement {
                elem,
                driver: self.driver.clone(),
            })
            .collect())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    async fn clear_session_state(&self) -> Result<()> {
        self.driver.delete_all_cookies().await?;
        self.driver
            .execute("window.localStorage.clear();", vec![])
            .await?;
        self.driver
            .execute("window.sessionStorage.clear();", vec![])
            .await?;
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        Ok(self.driver.clone().quit().await?)
    }
}
