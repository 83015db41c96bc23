//! Leitner box scheduling.
//!
//! The trainer uses exactly one algorithm: five boxes with fixed intervals.

pub mod leitner;

pub use leitner::{
    add_days, force_due, grade, interval_days, is_due, is_mastered, select_due,
    BOX_INTERVALS_DAYS,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ReviewState;

/// Result of scheduling a card after grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub previous_box: u8,
    pub new_box: u8,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review: DateTime<Utc>,
}

impl SchedulingResult {
    /// The state to hand to the persistence layer.
    pub fn new_state(&self) -> ReviewState {
        ReviewState::new(self.new_box, self.next_review)
    }
}
