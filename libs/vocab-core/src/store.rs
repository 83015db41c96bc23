//! Persistence seams and the local JSON store.
//!
//! The scheduler never touches storage. It reads and writes through
//! [`ProgressStore`] (per-card scheduling state) and, in local mode,
//! [`Repository`] for everything else. Two shapes of progress storage exist:
//! state embedded on the card itself ([`LocalStore`], `Vec<Card>`) and state
//! keyed per `(user, card)` ([`ProgressMap`]).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::types::{Card, NewCard, ReviewState, Role, User, WordSet};

/// Read and write the scheduling state of a card for a user.
pub trait ProgressStore {
    /// Current state; stores without a row for the pair return a default.
    fn progress(&self, user_id: Uuid, card: &Card) -> ReviewState;

    /// Replace the state for the pair.
    fn set_progress(&mut self, user_id: Uuid, card_id: Uuid, state: ReviewState) -> Result<()>;
}

/// Collections the local-mode trainer loads and persists.
pub trait Repository: ProgressStore {
    fn load_cards(&self) -> Result<Vec<Card>>;
    fn load_users(&self) -> Result<Vec<User>>;
    fn load_sets(&self) -> Result<Vec<WordSet>>;

    /// Store one card's box and next review time.
    fn persist_card_update(&mut self, card: &Card) -> Result<()>;
    /// Store one user's coins, correct count and study time.
    fn persist_user_update(&mut self, user: &User) -> Result<()>;

    fn insert_user(&mut self, user: User) -> Result<()>;
    fn insert_set(&mut self, set: WordSet) -> Result<()>;
    fn insert_card(&mut self, card: Card) -> Result<()>;

    /// Remove a set. Cards that reference it are left in place.
    fn delete_set(&mut self, set_id: Uuid) -> Result<bool>;
}

/// Embedded shape: the card carries its own box and review time.
impl ProgressStore for Vec<Card> {
    fn progress(&self, _user_id: Uuid, card: &Card) -> ReviewState {
        self.iter()
            .find(|c| c.id == card.id)
            .unwrap_or(card)
            .review_state()
    }

    fn set_progress(&mut self, _user_id: Uuid, card_id: Uuid, state: ReviewState) -> Result<()> {
        let card = self
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| CoreError::card_not_found(card_id))?;
        card.apply_review_state(state);
        Ok(())
    }
}

/// Per-user shape: state keyed by `(user_id, card_id)`.
///
/// Missing rows read as [`ReviewState::unseen`], so a card a user has never
/// studied is due immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressMap {
    entries: HashMap<(Uuid, Uuid), ReviewState>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: Uuid, card_id: Uuid, state: ReviewState) {
        self.entries.insert((user_id, card_id), state);
    }

    pub fn get(&self, user_id: Uuid, card_id: Uuid) -> Option<ReviewState> {
        self.entries.get(&(user_id, card_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Uuid, Uuid, ReviewState)> for ProgressMap {
    fn from_iter<I: IntoIterator<Item = (Uuid, Uuid, ReviewState)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (user_id, card_id, state) in iter {
            map.insert(user_id, card_id, state);
        }
        map
    }
}

impl ProgressStore for ProgressMap {
    fn progress(&self, user_id: Uuid, card: &Card) -> ReviewState {
        self.get(user_id, card.id).unwrap_or_else(ReviewState::unseen)
    }

    fn set_progress(&mut self, user_id: Uuid, card_id: Uuid, state: ReviewState) -> Result<()> {
        self.insert(user_id, card_id, state);
        Ok(())
    }
}

/// File contents of a [`LocalStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalData {
    #[serde(default)]
    pub sets: Vec<WordSet>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl LocalData {
    /// Starter content: one set, three words, one admin.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let set = WordSet::new("Book A", 1, now);
        let words = [
            ("meticulous", "very careful; precise", "She kept meticulous notes."),
            ("inevitable", "certain to happen", "Rain felt inevitable."),
            ("coherent", "logical and consistent", "A coherent essay."),
        ];
        let cards = words
            .iter()
            .filter_map(|(term, definition, example)| {
                NewCard {
                    set_id: set.id,
                    term: term.to_string(),
                    definition: definition.to_string(),
                    example: Some(example.to_string()),
                    language: Some("EN".to_string()),
                }
                .into_card(now)
            })
            .collect();
        let admin = User::new("Admin", "admin@example.com", Role::Admin, now);

        Self {
            sets: vec![set],
            cards,
            users: vec![admin],
        }
    }
}

/// Single-file JSON store; every mutation rewrites the file.
///
/// Scheduling state is embedded on the cards, so progress is shared by every
/// user of the store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: Option<PathBuf>,
    data: LocalData,
}

impl LocalStore {
    /// Open the store at `path`, seeding and writing starter content if the
    /// file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let data = if raw.trim().is_empty() {
                LocalData::default()
            } else {
                serde_json::from_str(&raw)?
            };
            return Ok(Self {
                path: Some(path),
                data,
            });
        }

        let store = Self {
            path: Some(path),
            data: LocalData::seeded(Utc::now()),
        };
        store.save()?;
        Ok(store)
    }

    /// Store that lives only in memory.
    pub fn in_memory(data: LocalData) -> Self {
        Self { path: None, data }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &LocalData {
        &self.data
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&self.data)?)?;
        Ok(())
    }
}

impl ProgressStore for LocalStore {
    fn progress(&self, user_id: Uuid, card: &Card) -> ReviewState {
        self.data.cards.progress(user_id, card)
    }

    fn set_progress(&mut self, user_id: Uuid, card_id: Uuid, state: ReviewState) -> Result<()> {
        self.data.cards.set_progress(user_id, card_id, state)?;
        self.save()
    }
}

impl Repository for LocalStore {
    fn load_cards(&self) -> Result<Vec<Card>> {
        Ok(self.data.cards.clone())
    }

    fn load_users(&self) -> Result<Vec<User>> {
        Ok(self.data.users.clone())
    }

    fn load_sets(&self) -> Result<Vec<WordSet>> {
        Ok(self.data.sets.clone())
    }

    fn persist_card_update(&mut self, card: &Card) -> Result<()> {
        self.set_progress(Uuid::nil(), card.id, card.review_state())
    }

    fn persist_user_update(&mut self, user: &User) -> Result<()> {
        let stored = self
            .data
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| CoreError::user_not_found(user.id))?;
        stored.coins = user.coins;
        stored.correct = user.correct;
        stored.time_ms = user.time_ms;
        self.save()
    }

    fn insert_user(&mut self, user: User) -> Result<()> {
        if self.data.users.iter().any(|u| u.email == user.email) {
            return Err(CoreError::DuplicateEmail(user.email));
        }
        self.data.users.push(user);
        self.save()
    }

    fn insert_set(&mut self, set: WordSet) -> Result<()> {
        self.data.sets.insert(0, set);
        self.save()
    }

    fn insert_card(&mut self, card: Card) -> Result<()> {
        self.data.cards.insert(0, card);
        self.save()
    }

    fn delete_set(&mut self, set_id: Uuid) -> Result<bool> {
        let before = self.data.sets.len();
        self.data.sets.retain(|s| s.id != set_id);
        let removed = self.data.sets.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }
}
