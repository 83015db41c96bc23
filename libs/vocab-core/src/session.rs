//! Review queues, quizzes and dashboard stats.
//!
//! Everything here is a pure function of the cards, the learner's progress
//! and a seed. Review order uses the seed directly; quiz generation uses the
//! seed plus [`QUIZ_SEED_OFFSET`] so the two orderings are not correlated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithm::{is_due, is_mastered};
use crate::rewards::REWARD_COINS;
use crate::rng::{pick_n, shuffle, shuffle_in_place, Mulberry32};
use crate::store::ProgressStore;
use crate::types::{Card, SessionContext, StudyStats, User};

/// Added to the session seed before generating a quiz.
pub const QUIZ_SEED_OFFSET: u32 = 999;
/// Questions per quiz, at most.
pub const MAX_QUIZ_QUESTIONS: usize = 15;
/// Wrong options per question, at most.
pub const MAX_DISTRACTORS: usize = 3;

/// Cards in a set, or every card when no set is selected (global view).
pub fn visible_cards<C: AsRef<Card>>(cards: &[C], set_id: Option<Uuid>) -> Vec<&Card> {
    cards
        .iter()
        .map(<C as AsRef<Card>>::as_ref)
        .filter(|c| set_id.map_or(true, |id| c.set_id == id))
        .collect()
}

/// Cards due for the acting user, in input order.
pub fn due_cards<'a, C, P>(cards: &'a [C], progress: &P, ctx: &SessionContext) -> Vec<&'a Card>
where
    C: AsRef<Card>,
    P: ProgressStore + ?Sized,
{
    cards
        .iter()
        .map(<C as AsRef<Card>>::as_ref)
        .filter(|c| is_due(progress.progress(ctx.user_id, c).next_review, ctx.now))
        .collect()
}

/// Due cards shuffled by `seed`. The first entry is the card to show next.
pub fn review_queue<'a, C, P>(
    cards: &'a [C],
    progress: &P,
    ctx: &SessionContext,
    seed: u32,
) -> Vec<&'a Card>
where
    C: AsRef<Card>,
    P: ProgressStore + ?Sized,
{
    let due = due_cards(cards, progress, ctx);
    shuffle(&due, &mut Mulberry32::new(seed))
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub card_id: Uuid,
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
}

impl QuizQuestion {
    /// Answers are compared exactly against the card's definition.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.answer
    }
}

/// Wrong options per question for a pool of `pool_len` cards.
pub fn distractor_count(pool_len: usize) -> usize {
    MAX_DISTRACTORS.min(pool_len.saturating_sub(1))
}

/// Build quiz questions for the first [`MAX_QUIZ_QUESTIONS`] cards of `pool`.
///
/// All questions draw from one generator stream: first the distractor pick,
/// then the option order.
pub fn build_quiz<C: AsRef<Card>>(pool: &[C], seed: u32) -> Vec<QuizQuestion> {
    let pool: Vec<&Card> = pool.iter().map(<C as AsRef<Card>>::as_ref).collect();
    let mut rng = Mulberry32::new(seed.wrapping_add(QUIZ_SEED_OFFSET));
    let wanted = distractor_count(pool.len());

    let mut questions = Vec::with_capacity(pool.len().min(MAX_QUIZ_QUESTIONS));
    for card in pool.iter().take(MAX_QUIZ_QUESTIONS) {
        let others: Vec<&Card> = pool.iter().copied().filter(|o| o.id != card.id).collect();

        let mut options = Vec::with_capacity(wanted + 1);
        options.push(card.definition.clone());
        options.extend(
            pick_n(&others, wanted, &mut rng)
                .into_iter()
                .map(|o| o.definition.clone()),
        );
        shuffle_in_place(&mut options, &mut rng);

        questions.push(QuizQuestion {
            card_id: card.id,
            question: card.term.clone(),
            answer: card.definition.clone(),
            options,
        });
    }
    questions
}

/// Outcome of answering the current quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub card_id: Uuid,
    pub correct: bool,
    pub answer: String,
}

/// A quiz in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    seed: u32,
    questions: Vec<QuizQuestion>,
    index: usize,
    score: usize,
}

impl QuizSession {
    pub fn generate<C: AsRef<Card>>(pool: &[C], seed: u32) -> Self {
        Self {
            seed,
            questions: build_quiz(pool, seed),
            index: 0,
            score: 0,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    /// Answer the current question and advance. `None` once the quiz is done.
    pub fn answer(&mut self, choice: &str) -> Option<QuizAnswer> {
        let question = self.questions.get(self.index)?;
        let correct = question.is_correct(choice);
        let outcome = QuizAnswer {
            card_id: question.card_id,
            correct,
            answer: question.answer.clone(),
        };
        if correct {
            self.score += 1;
        }
        self.index += 1;
        Some(outcome)
    }

    /// Done once every question is answered; an empty quiz is done at once.
    pub fn is_done(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// Zero-based index of the current question.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn coins_earned(&self) -> u64 {
        self.score as u64 * REWARD_COINS
    }

    /// Same cards, new seed, back to the first question.
    pub fn restart<C: AsRef<Card>>(&mut self, pool: &[C], seed: u32) {
        *self = Self::generate(pool, seed);
    }
}

/// Dashboard counters for the cards in view.
pub fn study_stats<C, P>(cards: &[C], progress: &P, user: &User, now: DateTime<Utc>) -> StudyStats
where
    C: AsRef<Card>,
    P: ProgressStore + ?Sized,
{
    let mut stats = StudyStats {
        words_in_view: cards.len(),
        coins: user.coins,
        study_minutes: user.study_minutes(),
        ..Default::default()
    };

    for card in cards.iter().map(<C as AsRef<Card>>::as_ref) {
        let state = progress.progress(user.id, card);
        if is_due(state.next_review, now) {
            stats.due_now += 1;
        }
        if is_mastered(state.leitner_box) {
            stats.mastered += 1;
        }
    }

    stats
}
