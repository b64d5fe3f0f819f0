// src/runner.rs

//! Scheduling and retry loop.
//!
//! Decides whether today is eligible, waits for the booking window,
//! retries the full attempt until success, the cutoff time, or the
//! attempt budget, and fires the terminal notifications.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::bot::ReservationBot;
use crate::config::BotConfig;
use crate::driver::PageDriver;
use crate::error::Result;
use crate::flow::ReservationOutcome;
use crate::notify::NotificationSink;
use crate::utils::timing;

/// Terminal state of a scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// This run newly booked the class.
    Booked,
    /// The class was already booked; marker written, nothing clicked.
    AlreadyBooked,
    /// The success marker predates this run; nothing was attempted.
    MarkerPresent,
    /// Today is not an eligible booking day; nothing was attempted.
    SkippedIneligibleDay,
    /// The cutoff time passed before an attempt succeeded.
    CutoffReached,
    /// The configured attempt budget ran out.
    RetriesExhausted,
}

impl RunOutcome {
    /// Whether the booking exists after this run.
    pub fn booked(&self) -> bool {
        matches!(self, Self::Booked | Self::AlreadyBooked | Self::MarkerPresent)
    }
}

/// Runs the booking policy around per-attempt sessions.
pub struct Runner<'a> {
    config: &'a BotConfig,
    notifier: &'a dyn NotificationSink,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a BotConfig, notifier: &'a dyn NotificationSink) -> Self {
        Self { config, notifier }
    }

    /// Run until success, cutoff, or attempt-budget exhaustion.
    ///
    /// `new_session` is called once per attempt; the previous session is
    /// always torn down before the next one starts.
    pub async fn run<D, F, Fut>(&self, new_session: F) -> Result<RunOutcome>
    where
        D: PageDriver,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<D>>,
    {
        self.run_with_clock(new_session, Utc::now).await
    }

    async fn run_with_clock<D, F, Fut, C>(&self, new_session: F, clock: C) -> Result<RunOutcome>
    where
        D: PageDriver,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<D>>,
        C: Fn() -> DateTime<Utc>,
    {
        let marker = self.config.marker_path();
        if marker.exists() {
            log::info!("Booking already completed ({} present)", marker.display());
            return Ok(RunOutcome::MarkerPresent);
        }

        let schedule = &self.config.schedule;
        let tz = schedule.timezone;
        let (today, weekday) = timing::local_today(clock(), tz);

        if !timing::is_booking_day(&schedule.booking_days, weekday) {
            log::info!("{:?} is not an eligible booking day, skipping run", weekday);
            return Ok(RunOutcome::SkippedIneligibleDay);
        }

        let target_date =
            timing::target_date(schedule.run_on_schedule, &self.config.target.date, today);
        let details = self.config.target.details(&target_date);

        let window = timing::local_instant(today, schedule.window_start, tz);
        if let Some(remaining) = timing::until(window, clock()) {
            log::info!(
                "Waiting {}s until the booking window opens at {}",
                remaining.as_secs(),
                window.format("%H:%M %Z")
            );
            tokio::time::sleep(remaining).await;
        }

        let cutoff = timing::local_instant(today, schedule.cutoff, tz);
        let mut attempt = 0u32;

        loop {
            if clock() >= cutoff.with_timezone(&Utc) {
                log::error!("Cutoff {} reached without a booking", cutoff.format("%H:%M %Z"));
                self.notifier
                    .send(
                        "Lifetime Bot - Failed",
                        &format!(
                            "Failed to book the class before the {} cutoff.\n\n{}",
                            cutoff.format("%H:%M %Z"),
                            details
                        ),
                    )
                    .await;
                return Ok(RunOutcome::CutoffReached);
            }

            attempt += 1;
            log::info!("Reservation attempt {}", attempt);

            match self.attempt(&new_session, &target_date).await {
                Ok(ReservationOutcome::Reserved) => {
                    self.write_marker()?;
                    return Ok(RunOutcome::Booked);
                }
                Ok(ReservationOutcome::AlreadyReserved) => {
                    self.write_marker()?;
                    return Ok(RunOutcome::AlreadyBooked);
                }
                Ok(ReservationOutcome::Failed) => {
                    log::warn!("Attempt {} failed", attempt);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("Attempt {} failed: {}", attempt, e);
                }
            }

            if let Some(max) = schedule.max_attempts {
                if attempt >= max {
                    self.notifier
                        .send(
                            "Lifetime Bot - All Attempts Failed",
                            &format!(
                                "Failed to reserve class after {} attempts.\n\n{}",
                                attempt, details
                            ),
                        )
                        .await;
                    return Ok(RunOutcome::RetriesExhausted);
                }
            }

            log::info!("Retrying in {}s", schedule.retry_interval_secs);
            tokio::time::sleep(std::time::Duration::from_secs(schedule.retry_interval_secs))
                .await;
        }
    }

    /// One attempt in a fresh browser session, always torn down afterward.
    async fn attempt<D, F, Fut>(&self, new_session: &F, target_date: &str) -> Result<ReservationOutcome>
    where
        D: PageDriver,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<D>>,
    {
        let driver = new_session().await?;
        let bot = ReservationBot::new(&driver, self.config, self.notifier);
        let result = bot.reserve(target_date).await;

        let failed = !matches!(
            &result,
            Ok(ReservationOutcome::Reserved) | Ok(ReservationOutcome::AlreadyReserved)
        );
        if failed {
            // Best-effort cleanup to reduce cross-attempt contamination.
            if let Err(e) = driver.clear_session_state().await {
                log::warn!("Browser cleanup failed: {}", e);
            }
        }
        if let Err(e) = driver.quit().await {
            log::warn!("Browser teardown failed: {}", e);
        }
        result
    }

    fn write_marker(&self) -> Result<()> {
        std::fs::write(self.config.marker_path(), "success")?;
        Ok(())
    }
}
