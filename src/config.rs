// src/config.rs

//! Application configuration structures.
//!
//! All configuration comes from environment variables, read once by
//! [`BotConfig::from_env`] into an immutable object. The loader never
//! mutates the process environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::error::{AppError, Result};

/// Email-to-SMS gateway domain for a carrier, if the carrier is known.
pub fn carrier_gateway(carrier: &str) -> Option<&'static str> {
    match carrier {
        "att" => Some("mms.att.net"),
        "tmobile" => Some("tmomail.net"),
        "verizon" => Some("vtext.com"),
        "sprint" => Some("messaging.sprintpcs.com"),
        "boost" => Some("sms.myboostmobile.com"),
        "cricket" => Some("sms.cricketwireless.net"),
        "metro" => Some("mymetropcs.com"),
        "uscellular" => Some("email.uscc.net"),
        "virgin" => Some("vmobl.com"),
        "xfinity" => Some("vtext.com"),
        "googlefi" => Some("msg.fi.google.com"),
        _ => None,
    }
}

/// Notification delivery method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMethod {
    Email,
    Sms,
    Telegram,
    Both,
}

impl NotificationMethod {
    /// Parse a method name. Unknown values fall back to Email.
    pub fn parse_or_default(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "email" => Self::Email,
            "sms" => Self::Sms,
            "telegram" => Self::Telegram,
            "both" => Self::Both,
            other => {
                if !other.is_empty() {
                    log::warn!("Unknown notification method '{}', defaulting to email", other);
                }
                Self::Email
            }
        }
    }

    /// Whether this method sends through the SMS gateway.
    pub fn uses_sms(&self) -> bool {
        matches!(self, Self::Sms | Self::Both)
    }
}

/// SMTP email settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub smtp_server: String,
    pub smtp_port: u16,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            sender: env_or("EMAIL_SENDER", ""),
            password: env_or("EMAIL_PASSWORD", ""),
            receiver: env_or("EMAIL_RECEIVER", ""),
            smtp_server: env_or("SMTP_SERVER", defaults::SMTP_SERVER),
            smtp_port: env_or("SMTP_PORT", "587").parse().unwrap_or(587),
        }
    }

    /// All fields needed to authenticate and address a message are present.
    pub fn is_configured(&self) -> bool {
        !self.sender.is_empty() && !self.password.is_empty() && !self.receiver.is_empty()
    }
}

/// SMS-via-email-gateway settings.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub number: String,
    pub carrier: String,
}

impl SmsConfig {
    fn from_env() -> Self {
        Self {
            number: env_or("SMS_NUMBER", ""),
            carrier: env_or("SMS_CARRIER", "").to_lowercase(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.number.is_empty() && carrier_gateway(&self.carrier).is_some()
    }

    /// The email-to-SMS gateway address for this number.
    ///
    /// An unknown carrier is a configuration error, not a delivery error.
    pub fn gateway_address(&self) -> Result<String> {
        let domain = carrier_gateway(&self.carrier).ok_or_else(|| {
            AppError::config(format!("Unsupported SMS carrier '{}'", self.carrier))
        })?;
        Ok(format!("{}@{}", self.number, domain))
    }
}

/// Telegram bot API settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    fn from_env() -> Self {
        Self {
            token: env_or("TELEGRAM_TOKEN", ""),
            chat_id: env_or("TELEGRAM_CHAT_ID", ""),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

/// The class to reserve.
#[derive(Debug, Clone)]
pub struct TargetClass {
    pub name: String,
    pub instructor: String,
    /// Explicit class date (YYYY-MM-DD); empty means "derive from today".
    pub date: String,
    /// Start time as rendered on the schedule page, e.g. "9:00 AM".
    pub start_time: String,
    pub end_time: String,
}

impl TargetClass {
    fn from_env() -> Self {
        Self {
            name: env_or("TARGET_CLASS", ""),
            instructor: env_or("TARGET_INSTRUCTOR", ""),
            date: env_or("TARGET_DATE", ""),
            start_time: env_or("START_TIME", ""),
            end_time: env_or("END_TIME", defaults::END_TIME),
        }
    }

    /// Human-readable details block used in notification bodies.
    pub fn details(&self, date: &str) -> String {
        format!(
            "Class: {}\nInstructor: {}\nDate: {}\nTime: {} - {}",
            self.name, self.instructor, date, self.start_time, self.end_time
        )
    }
}

/// Club identity used to build schedule URLs.
#[derive(Debug, Clone)]
pub struct ClubConfig {
    pub name: String,
    pub state: String,
}

impl ClubConfig {
    fn from_env() -> Self {
        Self {
            name: env_or("LIFETIME_CLUB_NAME", ""),
            state: env_or("LIFETIME_CLUB_STATE", ""),
        }
    }

    /// URL path segment derived from the club name.
    ///
    /// Strips the brand prefix, trims space/dash edges, folds " at " and
    /// " - " to "-", lower-cases, maps spaces to hyphens and drops anything
    /// that is not alphanumeric or a hyphen.
    pub fn url_segment(&self) -> String {
        let name = self.name.replace("Life Time", "").replace("LifeTime", "");
        let name = name.trim().trim_matches([' ', '-']);
        let name = name.replace(" at ", "-").replace(" - ", "-");
        let name = name.to_lowercase().replace(' ', "-");
        name.chars()
            .filter(|c| c.is_alphanumeric() || *c == '-')
            .collect()
    }

    /// `location` query parameter: spaces become `+`, nothing else escaped.
    pub fn url_param(&self) -> String {
        self.name.replace(' ', "+")
    }
}

/// Booking schedule and retry policy.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub run_on_schedule: bool,
    pub timezone: Tz,
    /// Daily time the booking window opens, local to `timezone`.
    pub window_start: NaiveTime,
    /// Daily time-of-day after which no further attempts start.
    pub cutoff: NaiveTime,
    pub retry_interval_secs: u64,
    /// None means unbounded (the cutoff is the only budget).
    pub max_attempts: Option<u32>,
    /// Weekdays on which booking runs are attempted at all.
    pub booking_days: Vec<Weekday>,
}

impl ScheduleConfig {
    fn from_env() -> Result<Self> {
        let timezone = env_or("TIMEZONE", defaults::TIMEZONE);
        let timezone = Tz::from_str(&timezone)
            .map_err(|e| AppError::config(format!("Invalid TIMEZONE '{}': {}", timezone, e)))?;

        Ok(Self {
            run_on_schedule: env_bool("RUN_ON_SCHEDULE"),
            timezone,
            window_start: parse_time_of_day(&env_or(
                "BOOKING_WINDOW_START",
                defaults::WINDOW_START,
            ))?,
            cutoff: parse_time_of_day(&env_or("BOOKING_CUTOFF", defaults::CUTOFF))?,
            retry_interval_secs: env_or("RETRY_INTERVAL_SECONDS", "60").parse().unwrap_or(60),
            max_attempts: env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()),
            booking_days: parse_booking_days(&env_or("BOOKING_DAYS", defaults::BOOKING_DAYS))?,
        })
    }
}

/// Browser session settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    /// WebDriver endpoint (chromedriver or Selenium).
    pub webdriver_url: String,
    pub wait_timeout_secs: u64,
    pub wait_poll_ms: u64,
}

impl BrowserConfig {
    fn from_env() -> Self {
        Self {
            headless: env_bool("HEADLESS"),
            webdriver_url: env_or("WEBDRIVER_URL", defaults::WEBDRIVER_URL),
            wait_timeout_secs: env_or("WAIT_TIMEOUT_SECONDS", "30").parse().unwrap_or(30),
            wait_poll_ms: env_or("WAIT_POLL_MS", "500").parse().unwrap_or(500),
        }
    }
}

/// Which class categories require a liability waiver before finishing.
#[derive(Debug, Clone)]
pub struct WaiverPolicy {
    /// Lowercase substrings matched against the class name.
    pub categories: Vec<String>,
}

impl WaiverPolicy {
    fn from_env() -> Self {
        let raw = env_or("WAIVER_CLASSES", defaults::WAIVER_CLASSES);
        Self {
            categories: raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn requires_waiver(&self, class_name: &str) -> bool {
        let name = class_name.to_lowercase();
        self.categories.iter().any(|c| name.contains(c))
    }
}

/// Root application configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub username: String,
    pub password: String,
    pub login_url: String,
    pub club: ClubConfig,
    pub target: TargetClass,
    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub telegram: TelegramConfig,
    pub notification_method: NotificationMethod,
    pub schedule: ScheduleConfig,
    pub browser: BrowserConfig,
    pub waiver: WaiverPolicy,
    /// Directory holding the success-marker file.
    pub data_dir: PathBuf,
}

impl BotConfig {
    /// Build configuration from the current environment.
    ///
    /// Reads each variable once; never mutates the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            username: env_or("LIFETIME_USERNAME", ""),
            password: env_or("LIFETIME_PASSWORD", ""),
            login_url: env_or("LOGIN_URL", defaults::LOGIN_URL),
            club: ClubConfig::from_env(),
            target: TargetClass::from_env(),
            email: EmailConfig::from_env(),
            sms: SmsConfig::from_env(),
            telegram: TelegramConfig::from_env(),
            notification_method: NotificationMethod::parse_or_default(&env_or(
                "NOTIFICATION_METHOD",
                "email",
            )),
            schedule: ScheduleConfig::from_env()?,
            browser: BrowserConfig::from_env(),
            waiver: WaiverPolicy::from_env(),
            data_dir: PathBuf::from(env_or("DATA_DIR", ".")),
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            return Err(AppError::validation(
                "LIFETIME_USERNAME and LIFETIME_PASSWORD are required",
            ));
        }
        if self.club.name.trim().is_empty() || self.club.state.trim().is_empty() {
            return Err(AppError::validation(
                "LIFETIME_CLUB_NAME and LIFETIME_CLUB_STATE are required",
            ));
        }
        if self.target.name.trim().is_empty() {
            return Err(AppError::validation("TARGET_CLASS is required"));
        }
        if self.target.start_time.trim().is_empty() || self.target.end_time.trim().is_empty() {
            return Err(AppError::validation("START_TIME and END_TIME are required"));
        }
        if !self.target.date.is_empty()
            && NaiveDate::parse_from_str(&self.target.date, "%Y-%m-%d").is_err()
        {
            return Err(AppError::validation(format!(
                "TARGET_DATE '{}' is not YYYY-MM-DD",
                self.target.date
            )));
        }
        if self.schedule.window_start >= self.schedule.cutoff {
            return Err(AppError::validation(
                "BOOKING_WINDOW_START must precede BOOKING_CUTOFF",
            ));
        }
        if self.schedule.retry_interval_secs == 0 {
            return Err(AppError::validation("RETRY_INTERVAL_SECONDS must be > 0"));
        }
        if self.schedule.booking_days.is_empty() {
            return Err(AppError::validation("BOOKING_DAYS must not be empty"));
        }
        if self.browser.wait_timeout_secs == 0 {
            return Err(AppError::validation("WAIT_TIMEOUT_SECONDS must be > 0"));
        }
        if self.notification_method.uses_sms() {
            // Surfaces the unknown-carrier case before any browser work.
            self.sms.gateway_address()?;
        }
        if self.notification_method == NotificationMethod::Telegram
            && !self.telegram.is_configured()
        {
            return Err(AppError::validation(
                "TELEGRAM_TOKEN and TELEGRAM_CHAT_ID are required for telegram notifications",
            ));
        }
        Ok(())
    }

    /// Path of the write-once success marker.
    pub fn marker_path(&self) -> PathBuf {
        self.data_dir.join(defaults::MARKER_FILE)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Parse "H:MM" or "H:MM:SS" as a local time-of-day.
fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| AppError::config(format!("Invalid time-of-day '{}': {}", value, e)))
}

/// Parse a comma-separated weekday list ("sun,mon,wed,thu").
fn parse_booking_days(value: &str) -> Result<Vec<Weekday>> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            Weekday::from_str(s)
                .map_err(|_| AppError::config(format!("Unknown weekday '{}' in BOOKING_DAYS", s)))
        })
        .collect()
}

mod defaults {
    pub const LOGIN_URL: &str = "https://my.lifetime.life/login.html";
    pub const SMTP_SERVER: &str = "smtp.gmail.com";
    pub const END_TIME: &str = "10:00 AM";
    pub const TIMEZONE: &str = "America/Chicago";
    pub const WINDOW_START: &str = "10:01";
    pub const CUTOFF: &str = "10:15";
    pub const BOOKING_DAYS: &str = "sun,mon,wed,thu";
    pub const WEBDRIVER_URL: &str = "http://localhost:9515";
    pub const WAIVER_CLASSES: &str = "pickleball";
    pub const MARKER_FILE: &str = ".booking_success";
}
