//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helpers for registering users and seeding sets and cards
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use uuid::Uuid;

use vocab_trainer_backend::config::Config;
use vocab_trainer_backend::db::Database;
use vocab_trainer_backend::models::{Card, DbCard, DbSet, NewCard, Role};
use vocab_trainer_backend::AppState;

/// A registered test user.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// Test context containing database connection and router.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    pub config: Config,
    app: Router,
    users: Vec<Uuid>,
    sets: Vec<Uuid>,
    cards: Vec<Uuid>,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let config = Config::from_env().expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let app = vocab_trainer_backend::router(AppState::new(db.clone(), config.clone()));

        Self {
            db,
            config,
            app,
            users: Vec::new(),
            sets: Vec::new(),
            cards: Vec::new(),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    /// Create a user directly in the database.
    pub async fn create_user(&mut self, role: Role) -> TestUser {
        let email = fixtures::unique_email(role.as_str());
        let user = self
            .db
            .create_user("Test User", &email, role)
            .await
            .expect("Failed to create test user");
        self.users.push(user.id);
        TestUser {
            id: user.id,
            token: user.token,
        }
    }

    /// Create a set with `terms.len()` cards; each definition is `"{term} meaning"`.
    pub async fn create_set_with_cards(&mut self, terms: &[&str]) -> (DbSet, Vec<DbCard>) {
        let set = self
            .db
            .create_set(&fixtures::unique_book(), 1)
            .await
            .expect("Failed to create test set");
        self.sets.push(set.id);

        let mut cards = Vec::new();
        for term in terms {
            let card: Card = NewCard {
                set_id: set.id,
                term: term.to_string(),
                definition: format!("{term} meaning"),
                example: None,
                language: None,
            }
            .into_card(chrono::Utc::now())
            .expect("valid card");
            let stored = self
                .db
                .create_card(&card, chrono::Utc::now())
                .await
                .expect("Failed to create test card");
            self.cards.push(stored.id);
            cards.push(stored);
        }

        (set, cards)
    }

    /// Remember ids created through the API so cleanup removes them.
    pub fn track_user(&mut self, id: Uuid) {
        self.users.push(id);
    }

    pub fn track_set(&mut self, id: Uuid) {
        self.sets.push(id);
    }

    pub fn track_card(&mut self, id: Uuid) {
        self.cards.push(id);
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up everything this context created.
    pub async fn cleanup(&self) {
        // Progress rows go with their users and cards
        for id in &self.users {
            let _ = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(self.db.pool())
                .await;
        }

        for id in &self.cards {
            let _ = sqlx::query("DELETE FROM cards WHERE id = $1")
                .bind(id)
                .execute(self.db.pool())
                .await;
        }

        for id in &self.sets {
            let _ = sqlx::query("DELETE FROM word_sets WHERE id = $1")
                .bind(id)
                .execute(self.db.pool())
                .await;
        }
    }
}
