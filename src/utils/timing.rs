// src/utils/timing.rs

//! Booking-date and time-window calculations.
//!
//! All functions take explicit `now`/`today` values so callers own the
//! clock and tests stay deterministic.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

/// Days ahead a class becomes bookable on the portal.
const BOOKING_HORIZON_DAYS: i64 = 8;

/// Calculate the target class date.
///
/// On a scheduled run the date is derived from the booking horizon;
/// otherwise the explicitly configured date is used, falling back to today.
pub fn target_date(run_on_schedule: bool, explicit: &str, today: NaiveDate) -> String {
    if run_on_schedule {
        return (today + ChronoDuration::days(BOOKING_HORIZON_DAYS))
            .format("%Y-%m-%d")
            .to_string();
    }
    if explicit.is_empty() {
        today.format("%Y-%m-%d").to_string()
    } else {
        explicit.to_string()
    }
}

/// Whether booking runs are permitted on the given weekday.
pub fn is_booking_day(days: &[Weekday], weekday: Weekday) -> bool {
    days.contains(&weekday)
}

/// The instant a daily time-of-day occurs on `date` in `tz`.
///
/// Around DST transitions an ambiguous local time resolves to the earlier
/// instant and a skipped local time to the following valid one.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Tz> {
    match date.and_time(time).and_local_timezone(tz) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => {
            // Skipped hour; step forward until the local time exists.
            let mut probe = date.and_time(time) + ChronoDuration::hours(1);
            loop {
                if let chrono::LocalResult::Single(dt) = probe.and_local_timezone(tz) {
                    return dt;
                }
                probe += ChronoDuration::hours(1);
            }
        }
    }
}

/// Time remaining until `target`, or `None` if it already passed.
pub fn until(target: DateTime<Tz>, now: DateTime<Utc>) -> Option<std::time::Duration> {
    (target.with_timezone(&Utc) - now).to_std().ok()
}

/// Today's date and weekday in the given timezone.
pub fn local_today(now: DateTime<Utc>, tz: Tz) -> (NaiveDate, Weekday) {
    let local = now.with_timezone(&tz);
    (local.date_naive(), local.weekday())
}
