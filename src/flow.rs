// src/flow.rs

//! Reservation flow state machine.
//!
//! Drives a class detail page from button evaluation through waiver and
//! finish to the confirmation banner. All step errors are caught at this
//! boundary and folded into [`ReservationOutcome::Failed`]; the retry
//! loop handles whole-attempt retries.

use crate::config::WaiverPolicy;
use crate::driver::{Locator, PageDriver, PageElement, WaitPolicy};
use crate::error::{AppError, Result};
use crate::notify::NotificationSink;

/// Terminal outcome of one reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// The class was newly booked (or waitlisted) by this run.
    Reserved,
    /// A cancel/leave-waitlist affordance was present; booking already exists.
    AlreadyReserved,
    /// No actionable button, or a downstream step errored.
    Failed,
}

/// Classification of a detail-page action button by its visible label.
///
/// Substring match, case-sensitive as rendered by the portal. The
/// already-reserved labels are checked first so "Cancel Reservation"
/// never classifies as Reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Cancel,
    LeaveWaitlist,
    Reserve,
    AddToWaitlist,
}

impl ButtonKind {
    pub fn classify(label: &str) -> Option<Self> {
        if label.contains("Cancel") {
            Some(Self::Cancel)
        } else if label.contains("Leave Waitlist") {
            Some(Self::LeaveWaitlist)
        } else if label.contains("Add to Waitlist") {
            Some(Self::AddToWaitlist)
        } else if label.contains("Reserve") {
            Some(Self::Reserve)
        } else {
            None
        }
    }

    /// The booking already exists; nothing should be clicked.
    pub fn means_already_reserved(&self) -> bool {
        matches!(self, Self::Cancel | Self::LeaveWaitlist)
    }
}

/// What button evaluation decided.
enum ButtonDecision {
    AlreadyReserved,
    Clicked,
}

fn reserve_button_selector() -> Locator {
    Locator::css("button[data-test-id='reserveButton']")
}

fn labeled_button_selector() -> Locator {
    Locator::xpath(
        "//button[contains(text(), 'Reserve')] | \
         //button[contains(text(), 'Add to Waitlist')] | \
         //button[contains(text(), 'Cancel')] | \
         //button[contains(text(), 'Leave Waitlist')]",
    )
}

fn waiver_label_selector() -> Locator {
    Locator::css("label[for='acceptwaiver']")
}

fn waiver_checkbox_selector() -> Locator {
    Locator::id("acceptwaiver")
}

fn finish_button_selector() -> Locator {
    Locator::xpath("//button[contains(text(), 'Finish')]")
}

fn confirmation_selector() -> Locator {
    Locator::xpath("//h1[contains(text(), 'Your reservation is complete')]")
}

/// State machine over a single class's detail page.
pub struct ReservationFlow<'a, D: PageDriver> {
    driver: &'a D,
    waiver: &'a WaiverPolicy,
    wait: WaitPolicy,
    notifier: &'a dyn NotificationSink,
}

impl<'a, D: PageDriver> ReservationFlow<'a, D> {
    pub fn new(
        driver: &'a D,
        waiver: &'a WaiverPolicy,
        wait: WaitPolicy,
        notifier: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            driver,
            waiver,
            wait,
            notifier,
        }
    }

    /// Run the flow to a terminal outcome.
    ///
    /// The already-reserved notification is emitted here as a side effect
    /// of that transition; callers must not notify again for it.
    pub async fn run(&self, class_name: &str, details: &str) -> ReservationOutcome {
        match self.try_run(class_name, details).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Reservation flow failed: {}", e);
                ReservationOutcome::Failed
            }
        }
    }

    async fn try_run(&self, class_name: &str, details: &str) -> Result<ReservationOutcome> {
        match self.evaluate_buttons(details).await? {
            ButtonDecision::AlreadyReserved => Ok(ReservationOutcome::AlreadyReserved),
            ButtonDecision::Clicked => {
                if self.waiver.requires_waiver(class_name) {
                    self.accept_waiver_if_present().await?;
                    self.click_finish().await?;
                } else {
                    // The page settles once the Finish control renders.
                    let finish = self
                        .driver
                        .wait_for(&finish_button_selector(), &self.wait)
                        .await
                        .map_err(|e| AppError::step("finish", e))?;
                    finish.click().await?;
                }
                if self.confirmed().await {
                    Ok(ReservationOutcome::Reserved)
                } else {
                    log::warn!("No confirmation banner after finishing");
                    Ok(ReservationOutcome::Failed)
                }
            }
        }
    }

    /// Evaluate the detail page's action buttons in page order and act on
    /// the first one that classifies.
    async fn evaluate_buttons(&self, details: &str) -> Result<ButtonDecision> {
        let mut buttons = self.driver.find_all(&reserve_button_selector()).await?;
        if buttons.is_empty() {
            buttons = self.driver.find_all(&labeled_button_selector()).await?;
        }
        if buttons.is_empty() {
            return Err(AppError::NoActionableButton);
        }

        for button in &buttons {
            let label = match button.text().await {
                Ok(label) => label,
                Err(_) => continue,
            };

            let Some(kind) = ButtonKind::classify(&label) else {
                continue;
            };

            if kind.means_already_reserved() {
                log::info!("Class is already reserved or on waitlist");
                self.notifier
                    .send(
                        "Lifetime Bot - Already Reserved",
                        &format!(
                            "The class was already reserved or waitlisted. \
                             No action needed.\n\n{}",
                            details
                        ),
                    )
                    .await;
                return Ok(ButtonDecision::AlreadyReserved);
            }

            button.scripted_click().await?;
            return Ok(ButtonDecision::Clicked);
        }

        Err(AppError::step(
            "reserve-button",
            "no button label classified as reserve/waitlist/cancel",
        ))
    }

    /// Accept the waiver when its checkbox is on the page.
    ///
    /// The label is clicked rather than the checkbox input, which is
    /// visually hidden. If the checkbox still reports unselected the label
    /// is clicked once more (idempotent toggle compensation for a flaky
    /// UI).
    async fn accept_waiver_if_present(&self) -> Result<()> {
        let locators = [waiver_label_selector(), finish_button_selector()];
        let (index, elem) = self
            .driver
            .wait_for_any(&locators, &self.wait)
            .await
            .map_err(|e| AppError::step("waiver", e))?;

        if index != 0 {
            // Finish rendered without a waiver; nothing to accept.
            return Ok(());
        }

        let label = elem;
        label.click().await?;

        let checkbox = self
            .driver
            .wait_for(&waiver_checkbox_selector(), &self.wait)
            .await
            .map_err(|e| AppError::step("waiver", e))?;
        if !checkbox.is_selected().await? {
            label.click().await?;
        }
        Ok(())
    }

    async fn click_finish(&self) -> Result<()> {
        let finish = self
            .driver
            .wait_for(&finish_button_selector(), &self.wait)
            .await
            .map_err(|e| AppError::step("finish", e))?;
        finish.click().await?;
        Ok(())
    }

    /// Bounded wait for the confirmation banner.
    async fn confirmed(&self) -> bool {
        self.driver
            .wait_for(&confirmation_selector(), &self.wait)
            .await
            .is_ok()
    }
}
