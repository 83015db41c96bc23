//! PostgreSQL database operations

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};
use uuid::Uuid;
use vocab_core::algorithm;
use vocab_core::rewards::Reward;
use vocab_core::session::QuizSession;
use vocab_core::store::ProgressMap;
use vocab_core::types::{normalize_email, set_title};
use vocab_core::CoreError;

use crate::error::{ApiError, Result};
use crate::models::*;

const USER_COLUMNS: &str = "id, name, email, role, token, coins, time_ms, correct, created_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a user with a generated bearer token.
    ///
    /// The email is stored lower-cased; a duplicate is a conflict.
    pub async fn create_user(&self, name: &str, email: &str, role: Role) -> Result<DbUser> {
        let token = Uuid::new_v4().simple().to_string();
        let user = sqlx::query_as::<_, DbUser>(&format!(
            r#"
            INSERT INTO users (id, name, email, role, token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(name.trim())
        .bind(normalize_email(email))
        .bind(role.as_str())
        .bind(&token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ApiError::Conflict(format!("email already registered: {}", normalize_email(email)))
            }
            other => ApiError::Database(other),
        })?;

        Ok(user)
    }

    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// All users in registration order
    pub async fn list_users(&self) -> Result<Vec<DbUser>> {
        let users = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Add a slice of study time to the user's total
    pub async fn add_study_time(&self, user_id: Uuid, elapsed_ms: u64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET time_ms = time_ms + $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(to_i64(elapsed_ms))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Set Repository ===

    /// Sets, newest first
    pub async fn list_sets(&self) -> Result<Vec<DbSet>> {
        let sets = sqlx::query_as::<_, DbSet>(
            r#"
            SELECT id, book, unit, title, created_at
            FROM word_sets
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sets)
    }

    pub async fn get_set(&self, set_id: Uuid) -> Result<Option<DbSet>> {
        let set = sqlx::query_as::<_, DbSet>(
            r#"
            SELECT id, book, unit, title, created_at
            FROM word_sets
            WHERE id = $1
            "#,
        )
        .bind(set_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(set)
    }

    pub async fn create_set(&self, book: &str, unit: i32) -> Result<DbSet> {
        let book = book.trim();
        let set = sqlx::query_as::<_, DbSet>(
            r#"
            INSERT INTO word_sets (id, book, unit, title)
            VALUES ($1, $2, $3, $4)
            RETURNING id, book, unit, title, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book)
        .bind(unit)
        .bind(set_title(book, unit))
        .fetch_one(&self.pool)
        .await?;

        Ok(set)
    }

    /// Delete a set. Its cards are kept.
    pub async fn delete_set(&self, set_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM word_sets WHERE id = $1")
            .bind(set_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Card Repository ===

    pub async fn get_card(&self, card_id: Uuid) -> Result<Option<DbCard>> {
        let card = sqlx::query_as::<_, DbCard>(
            r#"
            SELECT id, set_id, term, definition, example, language, created_at
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Cards in a set, or every card when no set is given; newest first.
    ///
    /// Cards of a deleted set only show up in the global listing.
    pub async fn list_cards(&self, set_id: Option<Uuid>) -> Result<Vec<DbCard>> {
        let cards = match set_id {
            Some(set_id) => {
                sqlx::query_as::<_, DbCard>(
                    r#"
                    SELECT c.id, c.set_id, c.term, c.definition, c.example, c.language, c.created_at
                    FROM cards c
                    JOIN word_sets s ON s.id = c.set_id
                    WHERE c.set_id = $1
                    ORDER BY c.created_at DESC, c.id
                    "#,
                )
                .bind(set_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbCard>(
                    r#"
                    SELECT id, set_id, term, definition, example, language, created_at
                    FROM cards
                    ORDER BY created_at DESC, id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(cards)
    }

    pub async fn create_card(&self, card: &Card, created_at: DateTime<Utc>) -> Result<DbCard> {
        let card = sqlx::query_as::<_, DbCard>(
            r#"
            INSERT INTO cards (id, set_id, term, definition, example, language, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, set_id, term, definition, example, language, created_at
            "#,
        )
        .bind(card.id)
        .bind(card.set_id)
        .bind(&card.term)
        .bind(&card.definition)
        .bind(&card.example)
        .bind(&card.language)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(card)
    }

    // === Progress Repository ===

    pub async fn get_progress(&self, user_id: Uuid, card_id: Uuid) -> Result<Option<DbProgress>> {
        let progress = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, card_id, leitner_box, next_review
            FROM progress
            WHERE user_id = $1 AND card_id = $2
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Every stored state for a user, ready for the core scheduler
    pub async fn progress_map(&self, user_id: Uuid) -> Result<ProgressMap> {
        let rows = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, card_id, leitner_box, next_review
            FROM progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.user_id, row.card_id, row.to_review_state()))
            .collect())
    }

    /// Insert or replace a user's state for a card
    pub async fn upsert_progress(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        state: ReviewState,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO progress (user_id, card_id, leitner_box, next_review)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, card_id) DO UPDATE SET
                leitner_box = EXCLUDED.leitner_box,
                next_review = EXCLUDED.next_review,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .bind(i16::from(state.leitner_box))
        .bind(state.next_review)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Make a card due for every learner without touching their boxes.
    ///
    /// Learners with no row are already due.
    pub async fn force_due(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE progress
            SET next_review = $2, updated_at = NOW()
            WHERE card_id = $1
            "#,
        )
        .bind(card_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Grade a card for a user as one transaction.
    ///
    /// The progress row is locked while the new state is computed, so two
    /// concurrent grades of the same card cannot both start from the old box.
    /// A card that is not due yet is rejected and nothing is written.
    pub async fn grade(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        is_easy: bool,
        now: DateTime<Utc>,
    ) -> Result<GradeRecord> {
        let mut tx = self.pool.begin().await?;

        let card_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cards WHERE id = $1)")
                .bind(card_id)
                .fetch_one(&mut *tx)
                .await?;
        if !card_exists {
            return Err(ApiError::NotFound("Card not found".to_string()));
        }

        // A learner without a row sees the card as unseen; create the row so it can be locked.
        let unseen = ReviewState::unseen();
        sqlx::query(
            r#"
            INSERT INTO progress (user_id, card_id, leitner_box, next_review)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, card_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .bind(i16::from(unseen.leitner_box))
        .bind(unseen.next_review)
        .execute(&mut *tx)
        .await?;

        let current = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, card_id, leitner_box, next_review
            FROM progress
            WHERE user_id = $1 AND card_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_one(&mut *tx)
        .await?
        .to_review_state();

        if !algorithm::is_due(current.next_review, now) {
            return Err(CoreError::NotDue(card_id).into());
        }

        let schedule = algorithm::grade(current.leitner_box, is_easy, now);
        let next = schedule.new_state();
        sqlx::query(
            r#"
            UPDATE progress
            SET leitner_box = $3, next_review = $4, updated_at = NOW()
            WHERE user_id = $1 AND card_id = $2
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .bind(i16::from(next.leitner_box))
        .bind(next.next_review)
        .execute(&mut *tx)
        .await?;

        let reward = Reward::for_answer(is_easy);
        let user = apply_reward(&mut tx, user_id, reward).await?;
        tx.commit().await?;

        Ok(GradeRecord {
            schedule,
            reward,
            user,
        })
    }

    // === Quiz Repository ===

    /// Replace the user's quiz with a freshly generated one
    pub async fn save_quiz(&self, user_id: Uuid, quiz: &QuizSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_sessions (user_id, session)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET
                session = EXCLUDED.session,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(Json(quiz))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Answer the current question of the user's quiz as one transaction.
    ///
    /// Only the current question can be answered, and only once; a correct
    /// answer is rewarded in the same transaction that advances the quiz.
    pub async fn answer_quiz(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        choice: &str,
    ) -> Result<QuizAnswerRecord> {
        let mut tx = self.pool.begin().await?;

        let Json(mut quiz) = sqlx::query_scalar::<_, Json<QuizSession>>(
            "SELECT session FROM quiz_sessions WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("No quiz in progress".to_string()))?;

        match quiz.current() {
            None => return Err(ApiError::Conflict("quiz is already finished".to_string())),
            Some(question) if question.card_id != card_id => {
                return Err(ApiError::Conflict(format!(
                    "card {card_id} is not the current question"
                )))
            }
            Some(_) => {}
        }
        let outcome = quiz
            .answer(choice)
            .ok_or_else(|| ApiError::Conflict("quiz is already finished".to_string()))?;

        sqlx::query(
            r#"
            UPDATE quiz_sessions
            SET session = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(Json(&quiz))
        .execute(&mut *tx)
        .await?;

        let reward = Reward::for_answer(outcome.correct);
        let user = apply_reward(&mut tx, user_id, reward).await?;
        tx.commit().await?;

        Ok(QuizAnswerRecord {
            outcome,
            reward,
            user,
            score: quiz.score(),
            finished: quiz.is_done(),
        })
    }
}

/// Apply a reward as an in-place increment and return the updated user.
/// An empty reward only reads the user.
async fn apply_reward(conn: &mut PgConnection, user_id: Uuid, reward: Reward) -> Result<DbUser> {
    let user = if reward.is_empty() {
        sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
    } else {
        sqlx::query_as::<_, DbUser>(&format!(
            r#"
            UPDATE users
            SET coins = coins + $2, correct = correct + $3
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(to_i64(reward.coins))
        .bind(to_i64(reward.correct))
        .fetch_optional(&mut *conn)
        .await?
    };

    user.ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
