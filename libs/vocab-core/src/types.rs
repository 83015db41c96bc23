//! Core types for the vocabulary trainer.
//!
//! Field names are canonical snake_case. Serde aliases accept the camelCase
//! spellings some stores write (`setId`, `nextReview`, `timeMs`, ...), so a
//! record is normalized the moment it crosses the persistence boundary.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Lowest Leitner box.
pub const MIN_BOX: u8 = 1;
/// Highest Leitner box.
pub const MAX_BOX: u8 = 5;

/// Language code used when a card does not specify one.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// Clamp any raw box value into `[MIN_BOX, MAX_BOX]`.
pub fn clamp_box(raw: i64) -> u8 {
    // The clamp bounds fit in u8, so the cast is lossless.
    raw.clamp(i64::from(MIN_BOX), i64::from(MAX_BOX)) as u8
}

/// Upper-case a language code, keep at most 5 characters, default to `EN`.
///
/// Upper-casing can lengthen a string (`ß` becomes `SS`), so the cut comes after it.
pub fn normalize_language(raw: &str) -> String {
    let code: String = raw.trim().to_uppercase().chars().take(5).collect();
    if code.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        code
    }
}

/// Emails compare case-insensitively, so they are stored lower-cased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Display title of a word set.
pub fn set_title(book: &str, unit: i32) -> String {
    format!("{book} • Unit {unit}")
}

/// Epoch zero, the review time of a card a user has never seen.
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(0).single().unwrap_or_default()
}

fn default_box() -> u8 {
    MIN_BOX
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Accept any JSON value for a box and clamp it; missing or malformed means box 1.
fn deserialize_box<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_f64())
        .map(|n| clamp_box(n as i64))
        .unwrap_or(MIN_BOX))
}

/// Scheduling state of one card for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    #[serde(rename = "box", default = "default_box", deserialize_with = "deserialize_box")]
    pub leitner_box: u8,
    #[serde(with = "chrono::serde::ts_milliseconds", alias = "nextReview")]
    pub next_review: DateTime<Utc>,
}

impl ReviewState {
    pub fn new(leitner_box: u8, next_review: DateTime<Utc>) -> Self {
        Self {
            leitner_box: clamp_box(i64::from(leitner_box)),
            next_review,
        }
    }

    /// State of a freshly created card: box 1, due immediately.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self::new(MIN_BOX, now)
    }

    /// State of a card with no per-user progress row yet.
    pub fn unseen() -> Self {
        Self::new(MIN_BOX, epoch())
    }
}

/// A vocabulary card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub term: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(rename = "box", default = "default_box", deserialize_with = "deserialize_box")]
    pub leitner_box: u8,
    #[serde(with = "chrono::serde::ts_milliseconds", alias = "nextReview")]
    pub next_review: DateTime<Utc>,
    #[serde(alias = "setId")]
    pub set_id: Uuid,
}

impl Card {
    /// Current embedded scheduling state.
    pub fn review_state(&self) -> ReviewState {
        ReviewState::new(self.leitner_box, self.next_review)
    }

    /// Overwrite the embedded scheduling state, clamping the box.
    pub fn apply_review_state(&mut self, state: ReviewState) {
        self.leitner_box = clamp_box(i64::from(state.leitner_box));
        self.next_review = state.next_review;
    }
}

impl AsRef<Card> for Card {
    fn as_ref(&self) -> &Card {
        self
    }
}

/// Input for creating a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCard {
    #[serde(alias = "setId")]
    pub set_id: Uuid,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl NewCard {
    /// Validate and build a card that is due immediately.
    ///
    /// Returns `None` when the term or definition is blank.
    pub fn into_card(self, now: DateTime<Utc>) -> Option<Card> {
        let term = self.term.trim().to_string();
        let definition = self.definition.trim().to_string();
        if term.is_empty() || definition.is_empty() {
            return None;
        }

        let example = self
            .example
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        let state = ReviewState::fresh(now);

        Some(Card {
            id: Uuid::new_v4(),
            term,
            definition,
            example,
            language: normalize_language(self.language.as_deref().unwrap_or_default()),
            leitner_box: state.leitner_box,
            next_review: state.next_review,
            set_id: self.set_id,
        })
    }
}

/// A word set (book + unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSet {
    pub id: Uuid,
    pub book: String,
    pub unit: i32,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl WordSet {
    pub fn new(book: &str, unit: i32, now: DateTime<Utc>) -> Self {
        let book = book.trim().to_string();
        Self {
            id: Uuid::new_v4(),
            title: set_title(&book, unit),
            book,
            unit,
            created_at: now,
        }
    }
}

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Student,
}

impl Role {
    /// Role granted at registration: admin only with the matching invite code.
    pub fn from_invite(invite_code: Option<&str>, admin_code: &str) -> Self {
        match invite_code {
            Some(code) if !admin_code.is_empty() && code.trim() == admin_code => Self::Admin,
            _ => Self::Student,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "student" => Ok(Self::Student),
            other => Err(CoreError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}

/// A learner or admin account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub coins: u64,
    #[serde(default, alias = "timeMs")]
    pub time_ms: u64,
    #[serde(default, alias = "correct_count")]
    pub correct: u64,
    #[serde(with = "chrono::serde::ts_milliseconds", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            role,
            coins: 0,
            time_ms: 0,
            correct: 0,
            created_at: now,
        }
    }

    /// Whole minutes of accumulated study time.
    pub fn study_minutes(&self) -> u64 {
        self.time_ms / 60_000
    }
}

/// Who is acting and when; passed explicitly to every scheduling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub now: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self { user_id, now }
    }

    /// Context stamped with the current wall-clock time.
    pub fn now(user_id: Uuid) -> Self {
        Self::new(user_id, Utc::now())
    }
}

/// Dashboard counters for the cards in view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStats {
    pub due_now: usize,
    pub words_in_view: usize,
    pub mastered: usize,
    pub coins: u64,
    pub study_minutes: u64,
}

/// One row of the coin leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub name: String,
    pub coins: u64,
    pub correct: u64,
    pub study_minutes: u64,
}
