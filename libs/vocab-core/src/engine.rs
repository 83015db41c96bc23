//! Local-mode trainer.
//!
//! [`Trainer`] runs every user-facing operation against a [`Repository`]:
//! it reads the current state, computes the new one with the pure
//! scheduling functions, and hands the result back as a single update.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithm::{self, SchedulingResult};
use crate::error::{CoreError, Result};
use crate::rewards::{self, Reward};
use crate::session::{self, QuizAnswer, QuizSession};
use crate::store::Repository;
use crate::timer::duration_ms;
use crate::types::{
    normalize_email, Card, LeaderboardEntry, NewCard, Role, SessionContext, StudyStats, User,
    WordSet,
};

/// Invite code that grants the admin role at registration.
pub const DEFAULT_ADMIN_INVITE_CODE: &str = "SUPERNOVA-ADMIN-2025";

/// Result of grading one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub card_id: Uuid,
    pub schedule: SchedulingResult,
    pub reward: Reward,
}

pub struct Trainer<R> {
    repo: R,
    admin_invite_code: String,
}

impl<R: Repository> Trainer<R> {
    pub fn new(repo: R) -> Self {
        Self::with_invite_code(repo, DEFAULT_ADMIN_INVITE_CODE)
    }

    pub fn with_invite_code(repo: R, admin_invite_code: impl Into<String>) -> Self {
        Self {
            repo,
            admin_invite_code: admin_invite_code.into(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    // === Users ===

    pub fn register(
        &mut self,
        now: DateTime<Utc>,
        name: &str,
        email: &str,
        invite_code: Option<&str>,
    ) -> Result<User> {
        let email = normalize_email(email);
        if name.trim().is_empty() || email.is_empty() {
            return Err(CoreError::InvalidInput("name and email are required".to_string()));
        }
        if self.repo.load_users()?.iter().any(|u| u.email == email) {
            return Err(CoreError::DuplicateEmail(email));
        }

        let role = Role::from_invite(invite_code, &self.admin_invite_code);
        let user = User::new(name, &email, role, now);
        self.repo.insert_user(user.clone())?;
        Ok(user)
    }

    pub fn user(&self, user_id: Uuid) -> Result<User> {
        self.repo
            .load_users()?
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| CoreError::user_not_found(user_id))
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(self.repo.load_users()?.into_iter().find(|u| u.email == email))
    }

    fn require_admin(&self, ctx: &SessionContext) -> Result<User> {
        let user = self.user(ctx.user_id)?;
        if !user.role.is_admin() {
            return Err(CoreError::Forbidden);
        }
        Ok(user)
    }

    fn card(&self, card_id: Uuid) -> Result<Card> {
        self.repo
            .load_cards()?
            .into_iter()
            .find(|c| c.id == card_id)
            .ok_or_else(|| CoreError::card_not_found(card_id))
    }

    /// Every card, or the cards of one existing set.
    ///
    /// Cards of a deleted set only show up in the global view.
    fn cards_in_view(&self, set_id: Option<Uuid>) -> Result<Vec<Card>> {
        let cards = self.repo.load_cards()?;
        if let Some(set_id) = set_id {
            if !self.repo.load_sets()?.iter().any(|s| s.id == set_id) {
                return Ok(Vec::new());
            }
        }
        Ok(session::visible_cards(&cards, set_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn reward_user(&mut self, user_id: Uuid, reward: Reward) -> Result<()> {
        if reward.is_empty() {
            return Ok(());
        }
        let mut user = self.user(user_id)?;
        rewards::apply_reward(&mut user, reward);
        self.repo.persist_user_update(&user)
    }

    // === Study ===

    /// Due cards in view, shuffled by `seed`.
    pub fn review_queue(
        &self,
        ctx: &SessionContext,
        set_id: Option<Uuid>,
        seed: u32,
    ) -> Result<Vec<Card>> {
        let cards = self.cards_in_view(set_id)?;
        Ok(session::review_queue(&cards, &self.repo, ctx, seed)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Grade a due card and reward an easy answer.
    ///
    /// A card that is not due yet cannot be graded.
    pub fn grade(
        &mut self,
        ctx: &SessionContext,
        card_id: Uuid,
        is_easy: bool,
    ) -> Result<GradeOutcome> {
        let card = self.card(card_id)?;
        let current = self.repo.progress(ctx.user_id, &card);
        if !algorithm::is_due(current.next_review, ctx.now) {
            return Err(CoreError::NotDue(card_id));
        }
        let schedule = algorithm::grade(current.leitner_box, is_easy, ctx.now);
        self.repo
            .set_progress(ctx.user_id, card_id, schedule.new_state())?;

        let reward = Reward::for_answer(is_easy);
        self.reward_user(ctx.user_id, reward)?;

        Ok(GradeOutcome {
            card_id,
            schedule,
            reward,
        })
    }

    /// Quiz over every card in view.
    pub fn quiz(&self, set_id: Option<Uuid>, seed: u32) -> Result<QuizSession> {
        let cards = self.cards_in_view(set_id)?;
        Ok(QuizSession::generate(&cards, seed))
    }

    /// Answer the current quiz question; a correct answer is rewarded.
    pub fn answer_quiz(
        &mut self,
        ctx: &SessionContext,
        quiz: &mut QuizSession,
        choice: &str,
    ) -> Result<Option<QuizAnswer>> {
        let Some(outcome) = quiz.answer(choice) else {
            return Ok(None);
        };
        self.reward_user(ctx.user_id, Reward::for_answer(outcome.correct))?;
        Ok(Some(outcome))
    }

    /// Add a finished slice of study time to the user's total.
    pub fn record_study_time(&mut self, user_id: Uuid, elapsed: Duration) -> Result<User> {
        let mut user = self.user(user_id)?;
        rewards::add_study_time(&mut user, duration_ms(elapsed));
        self.repo.persist_user_update(&user)?;
        Ok(user)
    }

    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        Ok(rewards::leaderboard(&self.repo.load_users()?))
    }

    pub fn stats(&self, ctx: &SessionContext, set_id: Option<Uuid>) -> Result<StudyStats> {
        let user = self.user(ctx.user_id)?;
        let cards = self.cards_in_view(set_id)?;
        Ok(session::study_stats(&cards, &self.repo, &user, ctx.now))
    }

    // === Admin ===

    pub fn add_set(&mut self, ctx: &SessionContext, book: &str, unit: i32) -> Result<WordSet> {
        self.require_admin(ctx)?;
        if book.trim().is_empty() {
            return Err(CoreError::InvalidInput("book is required".to_string()));
        }
        let set = WordSet::new(book, unit, ctx.now);
        self.repo.insert_set(set.clone())?;
        Ok(set)
    }

    /// Delete a set. Its cards stay and remain visible in the global view only.
    pub fn delete_set(&mut self, ctx: &SessionContext, set_id: Uuid) -> Result<bool> {
        self.require_admin(ctx)?;
        self.repo.delete_set(set_id)
    }

    pub fn add_card(&mut self, ctx: &SessionContext, input: NewCard) -> Result<Card> {
        self.require_admin(ctx)?;
        let set_id = input.set_id;
        if !self.repo.load_sets()?.iter().any(|s| s.id == set_id) {
            return Err(CoreError::set_not_found(set_id));
        }
        let card = input
            .into_card(ctx.now)
            .ok_or_else(|| CoreError::InvalidInput("term and definition are required".to_string()))?;
        self.repo.insert_card(card.clone())?;
        Ok(card)
    }

    /// Make a card due now without touching its box.
    pub fn force_due(&mut self, ctx: &SessionContext, card_id: Uuid) -> Result<Card> {
        self.require_admin(ctx)?;
        let mut card = self.card(card_id)?;
        let state = algorithm::force_due(card.review_state(), ctx.now);
        card.apply_review_state(state);
        self.repo.persist_card_update(&card)?;
        Ok(card)
    }
}
