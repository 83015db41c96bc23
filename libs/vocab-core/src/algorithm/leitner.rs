//! Five-box Leitner scheduler.
//!
//! An easy answer promotes a card one box (capped at box 5); a hard answer
//! sends it back to box 1. The next review lands the box's interval in
//! calendar days after the grading time.

use chrono::{DateTime, Days, Duration, TimeZone, Utc};

use super::SchedulingResult;
use crate::types::{clamp_box, Card, ReviewState, MAX_BOX, MIN_BOX};

/// Review interval in days for boxes 1 through 5.
pub const BOX_INTERVALS_DAYS: [u32; 5] = [1, 2, 4, 7, 15];

/// Interval of a box; out-of-range boxes are clamped first.
pub fn interval_days(leitner_box: u8) -> u32 {
    let index = usize::from(clamp_box(i64::from(leitner_box)) - MIN_BOX);
    BOX_INTERVALS_DAYS[index]
}

/// Add whole calendar days by moving the date component.
///
/// Month and year rollover follow the calendar (Jan 31 + 1 = Feb 1). If the
/// shifted local time does not exist the fixed-length duration is used instead.
pub fn add_days<Tz: TimeZone>(at: DateTime<Tz>, days: u32) -> DateTime<Tz> {
    at.clone()
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or_else(|| at + Duration::days(i64::from(days)))
}

/// Grade a card in `current_box`.
pub fn grade(current_box: u8, is_easy: bool, now: DateTime<Utc>) -> SchedulingResult {
    let previous_box = clamp_box(i64::from(current_box));
    let new_box = if is_easy {
        (previous_box + 1).min(MAX_BOX)
    } else {
        MIN_BOX
    };

    SchedulingResult {
        previous_box,
        new_box,
        next_review: add_days(now, interval_days(new_box)),
    }
}

/// Admin override: keep the box, make the card due right now.
pub fn force_due(state: ReviewState, now: DateTime<Utc>) -> ReviewState {
    ReviewState::new(state.leitner_box, now)
}

/// A card is due once its review time has been reached.
pub fn is_due(next_review: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    next_review <= now
}

/// Box 5 counts as mastered.
pub fn is_mastered(leitner_box: u8) -> bool {
    clamp_box(i64::from(leitner_box)) >= MAX_BOX
}

/// Cards whose embedded review time has been reached, in input order.
pub fn select_due<C: AsRef<Card>>(cards: &[C], now: DateTime<Utc>) -> Vec<&Card> {
    cards
        .iter()
        .map(<C as AsRef<Card>>::as_ref)
        .filter(|c| is_due(c.next_review, now))
        .collect()
}
