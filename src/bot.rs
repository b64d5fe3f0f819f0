// src/bot.rs

//! Per-attempt reservation orchestrator.
//!
//! One instance drives one full attempt against a live browser session:
//! login, schedule navigation, card matching, then the reservation flow.

use std::time::Instant;

use crate::config::BotConfig;
use crate::driver::{Locator, PageDriver, PageElement, WaitPolicy};
use crate::error::{AppError, Result};
use crate::flow::{ReservationFlow, ReservationOutcome};
use crate::notify::NotificationSink;
use crate::schedule;
use crate::utils;

fn planner_entry_selector() -> Locator {
    Locator::css(".planner-entry")
}

fn username_selector() -> Locator {
    Locator::name("username")
}

fn password_selector() -> Locator {
    Locator::name("password")
}

/// Drives one reservation attempt end to end.
pub struct ReservationBot<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a BotConfig,
    notifier: &'a dyn NotificationSink,
}

impl<'a, D: PageDriver> ReservationBot<'a, D> {
    pub fn new(driver: &'a D, config: &'a BotConfig, notifier: &'a dyn NotificationSink) -> Self {
        Self {
            driver,
            config,
            notifier,
        }
    }

    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            self.config.browser.wait_timeout_secs,
            self.config.browser.wait_poll_ms,
        )
    }

    /// Run one full attempt for the given class date.
    pub async fn reserve(&self, target_date: &str) -> Result<ReservationOutcome> {
        self.login().await?;
        self.navigate_to_schedule(target_date).await?;

        let cards = self.materialize_cards().await?;
        log::info!("Found {} classes on the page", cards.len());

        let mut texts = Vec::with_capacity(cards.len());
        for card in &cards {
            texts.push(card.text().await.unwrap_or_default());
        }

        let index = schedule::find_matching_card(&texts, &self.config.target)
            .ok_or_else(|| AppError::ClassNotFound(self.config.target.name.clone()))?;
        log::info!(
            "Found matching class: {}",
            schedule::normalize_card_text(&texts[index])
        );

        let detail_url = self.card_link(&cards[index]).await?;
        self.driver.navigate(&detail_url).await?;

        let details = self.config.target.details(target_date);
        let flow = ReservationFlow::new(
            self.driver,
            &self.config.waiver,
            self.wait_policy(),
            self.notifier,
        );
        let outcome = flow.run(&self.config.target.name, &details).await;

        if outcome == ReservationOutcome::Reserved {
            self.notifier
                .send(
                    "Lifetime Bot - Success",
                    &format!("Your class was successfully reserved!\n\n{}", details),
                )
                .await;
        }
        Ok(outcome)
    }

    /// Log into the member portal.
    async fn login(&self) -> Result<()> {
        let wait = self.wait_policy();
        self.driver.navigate(&self.config.login_url).await?;

        let username = self.driver.wait_for(&username_selector(), &wait).await?;
        username.type_text(&self.config.username).await?;

        let password = self.driver.wait_for(&password_selector(), &wait).await?;
        password.type_text(&self.config.password).await?;
        password.press_enter().await?;

        self.wait_for_login_settle(&wait).await;
        log::info!("Logged in successfully");
        Ok(())
    }

    /// Poll until the browser leaves the login page.
    ///
    /// Some portal variants redirect elsewhere than the member home, so a
    /// timeout here is soft: proceed and let the schedule wait decide.
    async fn wait_for_login_settle(&self, wait: &WaitPolicy) {
        let deadline = Instant::now() + wait.timeout;
        loop {
            if let Ok(url) = self.driver.current_url().await {
                if !url.contains("login") {
                    return;
                }
            }
            if Instant::now() >= deadline {
                log::warn!("Still on the login page after the wait timeout, continuing");
                return;
            }
            tokio::time::sleep(wait.poll).await;
        }
    }

    async fn navigate_to_schedule(&self, target_date: &str) -> Result<()> {
        let url = schedule::schedule_url(&self.config.club, target_date);
        self.driver.navigate(&url).await?;
        log::info!("Navigated to schedule page for {}", target_date);

        self.driver
            .wait_for(&planner_entry_selector(), &self.wait_policy())
            .await
            .map_err(|e| AppError::navigation("schedule page", e))?;
        Ok(())
    }

    /// Scroll to the bottom and poll until the card count stops growing,
    /// so lazily-rendered entries are fully materialized before matching.
    async fn materialize_cards(&self) -> Result<Vec<D::Elem>> {
        let wait = self.wait_policy();
        self.driver.scroll_to_bottom().await?;

        let mut cards = self.driver.find_all(&planner_entry_selector()).await?;
        let deadline = Instant::now() + wait.timeout;
        loop {
            tokio::time::sleep(wait.poll).await;
            let next = self.driver.find_all(&planner_entry_selector()).await?;
            let settled = next.len() == cards.len();
            cards = next;
            if settled || Instant::now() >= deadline {
                break;
            }
        }
        Ok(cards)
    }

    /// Resolve the matched card's detail link against the current page.
    async fn card_link(&self, card: &D::Elem) -> Result<String> {
        let href = card
            .link_href()
            .await?
            .ok_or_else(|| AppError::step("card-link", "matched card has no link"))?;
        let base = self.driver.current_url().await?;
        Ok(utils::resolve(&base, &href).unwrap_or(href))
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Scripted portal pages shared by bot and runner tests.

    use std::path::PathBuf;
    use std::sync::Arc;

    use chrono::{NaiveTime, Weekday};

    use super::*;
    use crate::config::{
        BrowserConfig, ClubConfig, EmailConfig, NotificationMethod, ScheduleConfig, SmsConfig,
        TargetClass, TelegramConfig, WaiverPolicy,
    };
    use crate::driver::fake::{FakeDriver, FakeElement};

    pub const DETAIL_URL: &str = "https://my.lifetime.life/classes/pickleball.html";

    pub fn labeled_button_selector() -> Locator {
        Locator::xpath(
            "//button[contains(text(), 'Reserve')] | \
             //button[contains(text(), 'Add to Waitlist')] | \
             //button[contains(text(), 'Cancel')] | \
             //button[contains(text(), 'Leave Waitlist')]",
        )
    }

    pub fn test_config(data_dir: PathBuf) -> BotConfig {
        BotConfig {
            username: "member@example.com".into(),
            password: "hunter2".into(),
            login_url: "https://my.lifetime.life/login.html".into(),
            club: ClubConfig {
                name: "Life Time - Flower Mound".into(),
                state: "TX".into(),
            },
            target: TargetClass {
                name: "Pickleball".into(),
                instructor: "John D".into(),
                date: "2026-03-10".into(),
                start_time: "9:00 AM".into(),
                end_time: "10:00 AM".into(),
            },
            email: EmailConfig {
                sender: String::new(),
                password: String::new(),
                receiver: String::new(),
                smtp_server: "smtp.gmail.com".into(),
                smtp_port: 587,
            },
            sms: SmsConfig {
                number: String::new(),
                carrier: String::new(),
            },
            telegram: TelegramConfig {
                token: String::new(),
                chat_id: String::new(),
            },
            notification_method: NotificationMethod::Email,
            schedule: ScheduleConfig {
                run_on_schedule: false,
                timezone: chrono_tz::America::Chicago,
                window_start: NaiveTime::from_hms_opt(10, 1, 0).unwrap(),
                cutoff: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
                retry_interval_secs: 0,
                max_attempts: None,
                booking_days: vec![Weekday::Sun, Weekday::Mon, Weekday::Wed, Weekday::Thu],
            },
            browser: BrowserConfig {
                headless: true,
                webdriver_url: "http://localhost:9515".into(),
                wait_timeout_secs: 1,
                wait_poll_ms: 1,
            },
            waiver: WaiverPolicy {
                categories: vec!["pickleball".into()],
            },
            data_dir,
        }
    }

    /// Handles to the scripted elements so tests can assert interactions
    /// after the attempt navigated away from their pages.
    pub struct ScriptedPortal {
        pub username: Arc<FakeElement>,
        pub password: Arc<FakeElement>,
        pub reserve: Arc<FakeElement>,
        pub finish: Arc<FakeElement>,
    }

    /// Script login and schedule pages onto a driver; the detail page is
    /// left to the caller.
    pub fn script_portal_without_detail(config: &BotConfig) -> (FakeDriver, ScriptedPortal) {
        let driver = FakeDriver::new()
            .with_login_redirect(&config.login_url, "https://my.lifetime.life/home");

        let username = FakeElement::labeled("username");
        let password = FakeElement::labeled("password");
        driver.place(&config.login_url, username_selector(), username.clone());
        driver.place(&config.login_url, password_selector(), password.clone());

        let schedule_url = schedule::schedule_url(&config.club, &config.target.date);
        driver.place(
            &schedule_url,
            planner_entry_selector(),
            FakeElement::labeled("Yoga\nJane S\n11:00 to 12:00 AM"),
        );
        driver.place(
            &schedule_url,
            planner_entry_selector(),
            FakeElement::with_href("Pickleball\nJohn D\n9:00 to 10:00 AM", DETAIL_URL),
        );

        let portal = ScriptedPortal {
            username,
            password,
            reserve: FakeElement::labeled("Reserve"),
            finish: FakeElement::labeled("Finish"),
        };
        (driver, portal)
    }

    /// A driver scripted for a complete successful reservation.
    pub fn scripted_success_driver(config: &BotConfig) -> (FakeDriver, ScriptedPortal) {
        let (driver, portal) = script_portal_without_detail(config);

        driver.place(
            DETAIL_URL,
            Locator::css("button[data-test-id='reserveButton']"),
            portal.reserve.clone(),
        );
        driver.place(
            DETAIL_URL,
            Locator::css("label[for='acceptwaiver']"),
            FakeElement::labeled("I accept the waiver"),
        );
        driver.place(
            DETAIL_URL,
            Locator::id("acceptwaiver"),
            FakeElement::with_selected("acceptwaiver", &[true]),
        );
        driver.place(
            DETAIL_URL,
            Locator::xpath("//button[contains(text(), 'Finish')]"),
            portal.finish.clone(),
        );
        driver.place(
            DETAIL_URL,
            Locator::xpath("//h1[contains(text(), 'Your reservation is complete')]"),
            FakeElement::labeled("Your reservation is complete"),
        );
        (driver, portal)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testkit::{
        labeled_button_selector, script_portal_without_detail, scripted_success_driver,
        test_config, DETAIL_URL,
    };
    use super::*;
    use crate::driver::fake::FakeElement;
    use crate::notify::recording::RecordingSink;

    #[tokio::test]
    async fn test_full_attempt_reserves_and_notifies_once() {
        let config = test_config(std::env::temp_dir());
        let (driver, portal) = scripted_success_driver(&config);
        let sink = RecordingSink::new();

        let bot = ReservationBot::new(&driver, &config, &sink);
        let outcome = bot.reserve(&config.target.date).await.unwrap();

        assert_eq!(outcome, ReservationOutcome::Reserved);
        assert_eq!(sink.subjects(), vec!["Lifetime Bot - Success".to_string()]);
        assert_eq!(portal.reserve.scripted_clicks.load(Ordering::SeqCst), 1);
        assert_eq!(portal.finish.click_count(), 1);
    }

    #[tokio::test]
    async fn test_already_reserved_attempt_notifies_exactly_once() {
        let config = test_config(std::env::temp_dir());
        let (driver, _portal) = script_portal_without_detail(&config);
        let cancel = FakeElement::labeled("Cancel Reservation");
        driver.place(DETAIL_URL, labeled_button_selector(), cancel.clone());

        let sink = RecordingSink::new();
        let bot = ReservationBot::new(&driver, &config, &sink);
        let outcome = bot.reserve(&config.target.date).await.unwrap();

        assert_eq!(outcome, ReservationOutcome::AlreadyReserved);
        assert_eq!(cancel.click_count(), 0);
        assert_eq!(
            sink.subjects(),
            vec!["Lifetime Bot - Already Reserved".to_string()]
        );
    }

    #[tokio::test]
    async fn test_no_matching_card_is_class_not_found() {
        let mut config = test_config(std::env::temp_dir());
        config.target.instructor = "Somebody Else".into();
        let (driver, _portal) = scripted_success_driver(&config);

        let sink = RecordingSink::new();
        let bot = ReservationBot::new(&driver, &config, &sink);
        let date = config.target.date.clone();
        assert!(matches!(
            bot.reserve(&date).await,
            Err(AppError::ClassNotFound(_))
        ));
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_schedule_is_navigation_error() {
        let config = test_config(std::env::temp_dir());
        let (driver, _portal) = script_portal_without_detail(&config);
        // Point the target at a date whose schedule page was never scripted.
        let mut config = config;
        config.target.date = "2026-03-11".into();

        let sink = RecordingSink::new();
        let bot = ReservationBot::new(&driver, &config, &sink);
        let date = config.target.date.clone();
        assert!(matches!(
            bot.reserve(&date).await,
            Err(AppError::Navigation { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_types_credentials_and_submits() {
        let config = test_config(std::env::temp_dir());
        let (driver, portal) = scripted_success_driver(&config);
        let sink = RecordingSink::new();

        let bot = ReservationBot::new(&driver, &config, &sink);
        bot.reserve(&config.target.date).await.unwrap();

        assert_eq!(
            *portal.username.typed.lock().unwrap(),
            vec!["member@example.com".to_string()]
        );
        assert_eq!(
            *portal.password.typed.lock().unwrap(),
            vec!["hunter2".to_string()]
        );
        assert_eq!(portal.password.enters.load(Ordering::SeqCst), 1);
    }
}
