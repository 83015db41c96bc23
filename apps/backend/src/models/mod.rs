//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from vocab-core
pub use vocab_core::types::{
    Card, LeaderboardEntry, NewCard, ReviewState, Role, StudyStats, User, WordSet,
};
use vocab_core::algorithm::SchedulingResult;
use vocab_core::rewards::Reward;
use vocab_core::session::QuizAnswer;
use vocab_core::types::clamp_box;

// === Database Entity Types ===

/// User row. The token is the bearer credential.
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub token: String,
    pub coins: i64,
    pub time_ms: i64,
    pub correct: i64,
    pub created_at: DateTime<Utc>,
}

impl DbUser {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    /// Convert to the core user type
    pub fn to_core_user(&self) -> User {
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            coins: non_negative(self.coins),
            time_ms: non_negative(self.time_ms),
            correct: non_negative(self.correct),
            created_at: self.created_at,
        }
    }
}

/// Word set row
#[derive(Debug, Clone, FromRow)]
pub struct DbSet {
    pub id: Uuid,
    pub book: String,
    pub unit: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl DbSet {
    pub fn to_core_set(&self) -> WordSet {
        WordSet {
            id: self.id,
            book: self.book.clone(),
            unit: self.unit,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// Card row. Scheduling state lives in `progress`, per user.
#[derive(Debug, Clone, FromRow)]
pub struct DbCard {
    pub id: Uuid,
    pub set_id: Uuid,
    pub term: String,
    pub definition: String,
    pub example: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl DbCard {
    /// Convert to the core card type with the given learner's state
    pub fn to_core_card(&self, state: ReviewState) -> Card {
        Card {
            id: self.id,
            term: self.term.clone(),
            definition: self.definition.clone(),
            example: self.example.clone(),
            language: self.language.clone(),
            leitner_box: state.leitner_box,
            next_review: state.next_review,
            set_id: self.set_id,
        }
    }
}

/// Per-user scheduling state
#[derive(Debug, Clone, FromRow)]
pub struct DbProgress {
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub leitner_box: i16,
    pub next_review: DateTime<Utc>,
}

impl DbProgress {
    pub fn to_review_state(&self) -> ReviewState {
        ReviewState::new(clamp_box(i64::from(self.leitner_box)), self.next_review)
    }
}

/// A committed grade: the new schedule, what it paid and the user afterwards
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub schedule: SchedulingResult,
    pub reward: Reward,
    pub user: DbUser,
}

/// A committed quiz answer and where the quiz stands afterwards
#[derive(Debug, Clone)]
pub struct QuizAnswerRecord {
    pub outcome: QuizAnswer,
    pub reward: Reward,
    pub user: DbUser,
    pub score: usize,
    pub finished: bool,
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

// === API Request/Response Types ===

// Auth

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub invite_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
    pub role: Role,
}

// Sets and cards

#[derive(Debug, Deserialize)]
pub struct CreateSetRequest {
    pub book: String,
    pub unit: i32,
}

#[derive(Debug, Serialize)]
pub struct DeleteSetResponse {
    pub deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SetFilterQuery {
    pub set_id: Option<Uuid>,
}

// Study

#[derive(Debug, Default, Deserialize)]
pub struct SeededQuery {
    pub set_id: Option<Uuid>,
    pub seed: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct StudyQueueResponse {
    pub seed: u32,
    pub cards: Vec<Card>,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub card_id: Uuid,
    pub is_easy: bool,
}

#[derive(Debug, Serialize)]
pub struct GradeResponse {
    pub card_id: Uuid,
    pub previous_box: u8,
    #[serde(rename = "box")]
    pub new_box: u8,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub next_review: DateTime<Utc>,
    pub coins_awarded: u64,
    pub coins: u64,
}

// Quiz

/// A question as sent to the client; the answer stays on the server.
#[derive(Debug, Serialize)]
pub struct QuizQuestionView {
    pub card_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub seed: u32,
    pub questions: Vec<QuizQuestionView>,
}

#[derive(Debug, Deserialize)]
pub struct QuizAnswerRequest {
    pub card_id: Uuid,
    pub choice: String,
}

#[derive(Debug, Serialize)]
pub struct QuizAnswerResponse {
    pub correct: bool,
    pub answer: String,
    pub coins_awarded: u64,
    pub coins: u64,
    /// Correct answers so far in this quiz
    pub score: usize,
    pub finished: bool,
}

// Study session

#[derive(Debug, Serialize)]
pub struct SessionStartResponse {
    pub started: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionHeartbeatResponse {
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionStopResponse {
    pub stopped: bool,
    /// Milliseconds recorded by the session that just ended
    pub session_ms: u64,
}
