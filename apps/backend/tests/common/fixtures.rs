//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

/// Generate a unique test email to avoid collisions.
pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Generate a unique book name.
pub fn unique_book() -> String {
    format!("Book {}", &Uuid::new_v4().simple().to_string()[..8])
}

/// Create a register request body.
pub fn register_request(name: &str, email: &str, invite_code: Option<&str>) -> serde_json::Value {
    match invite_code {
        Some(code) => json!({ "name": name, "email": email, "invite_code": code }),
        None => json!({ "name": name, "email": email }),
    }
}

/// Create a set request body.
pub fn create_set_request(book: &str, unit: i32) -> serde_json::Value {
    json!({ "book": book, "unit": unit })
}

/// Create a card request body.
pub fn create_card_request(set_id: Uuid, term: &str, definition: &str) -> serde_json::Value {
    json!({
        "setId": set_id,
        "term": term,
        "definition": definition,
        "language": "en"
    })
}

/// Create a grade request body.
pub fn grade_request(card_id: Uuid, is_easy: bool) -> serde_json::Value {
    json!({ "card_id": card_id, "is_easy": is_easy })
}

/// Create a quiz answer request body.
pub fn quiz_answer_request(card_id: Uuid, choice: &str) -> serde_json::Value {
    json!({ "card_id": card_id, "choice": choice })
}
