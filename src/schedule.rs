// src/schedule.rs

//! Schedule page model.
//!
//! Pure text-level logic: deciding whether one rendered schedule card is
//! the target class, and building the schedule URL. Card texts arrive as
//! opaque blobs scraped by the caller; nothing here touches the browser.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ClubConfig, TargetClass};

/// Time range as rendered inside a card, e.g. "9:00 to 10:00 AM".
///
/// The AM/PM suffix is shared by both ends; a range crossing noon such as
/// "11:45 to 12:15 PM" derives "11:45 PM" as its start.
static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2}:\d{2})\s?to\s?(\d{1,2}:\d{2})\s?(AM|PM)").unwrap()
});

/// Collapse all whitespace runs (including newlines) to single spaces.
pub fn normalize_card_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the (start, end) time strings from a card blob.
///
/// Returns `None` when no recognizable range is present, in which case the
/// card can never match.
pub fn parse_time_range(text: &str) -> Option<(String, String)> {
    let caps = TIME_RANGE.captures(text)?;
    let suffix = &caps[3];
    Some((
        format!("{} {}", &caps[1], suffix),
        format!("{} {}", &caps[2], suffix),
    ))
}

/// Whether a single card satisfies all four target predicates.
pub fn card_matches(card_text: &str, target: &TargetClass) -> bool {
    let text = normalize_card_text(card_text);
    let Some((start, end)) = parse_time_range(&text) else {
        return false;
    };

    let text_lower = text.to_lowercase();
    text_lower.contains(target.name.trim().to_lowercase().as_str())
        && text_lower.contains(target.instructor.trim().to_lowercase().as_str())
        && start
            .trim()
            .eq_ignore_ascii_case(target.start_time.trim())
        && end.trim().eq_ignore_ascii_case(target.end_time.trim())
}

/// Index of the first card (in page order) matching the target.
///
/// First-match-wins; scanning stops at the first hit.
pub fn find_matching_card(cards: &[String], target: &TargetClass) -> Option<usize> {
    cards.iter().position(|card| card_matches(card, target))
}

/// Day-view schedule URL for the club and date.
pub fn schedule_url(club: &ClubConfig, date: &str) -> String {
    format!(
        "https://my.lifetime.life/clubs/{}/{}/classes.html?\
         teamMemberView=true&selectedDate={}&mode=day&location={}",
        club.state.to_lowercase(),
        club.url_segment(),
        date,
        club.url_param()
    )
}
