//! Core vocabulary trainer library shared by the local trainer and the backend.
//!
//! Provides:
//! - Leitner box scheduling (five boxes, fixed intervals)
//! - Seeded shuffling (mulberry32) for review order and quizzes
//! - Quiz generation, rewards and the coin leaderboard
//! - Study-time accounting
//! - A local JSON store and the persistence traits the backend implements

pub mod algorithm;
pub mod engine;
pub mod error;
pub mod rewards;
pub mod rng;
pub mod session;
pub mod store;
pub mod timer;
pub mod types;

pub use algorithm::SchedulingResult;
pub use engine::{GradeOutcome, Trainer, DEFAULT_ADMIN_INVITE_CODE};
pub use error::{CoreError, Result};
pub use rewards::{leaderboard, Reward, REWARD_COINS};
pub use rng::{shuffle, Mulberry32};
pub use session::{build_quiz, review_queue, study_stats, QuizAnswer, QuizQuestion, QuizSession};
pub use store::{LocalData, LocalStore, ProgressMap, ProgressStore, Repository};
pub use timer::{duration_ms, StudyClock, DEFAULT_TICK};
pub use types::{
    Card, LeaderboardEntry, NewCard, ReviewState, Role, SessionContext, StudyStats, User, WordSet,
};
