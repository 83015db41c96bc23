//! Quiz, leaderboard and session API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use uuid::Uuid;

use common::fixtures;
use common::TestContext;
use vocab_trainer_backend::models::Role;

/// Test quiz questions hide the answer and include it among the options.
#[tokio::test]
#[ignore = "requires database"]
async fn test_quiz_questions() {
    let mut ctx = TestContext::new().await;
    let server = ctx.server();
    let student = ctx.create_user(Role::Student).await;
    let (set, _) = ctx
        .create_set_with_cards(&["one", "two", "three", "four", "five"])
        .await;
    let url = format!("/api/quiz?set_id={}&seed=7", set.id);
    let auth = TestContext::auth_header_value(&student.token);

    let quiz: serde_json::Value = server
        .get(&url)
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    let again: serde_json::Value = server
        .get(&url)
        .add_header(AUTHORIZATION, auth)
        .await
        .json();

    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    assert_eq!(quiz["questions"], again["questions"]);
    for q in questions {
        assert!(q.get("answer").is_none());
        let options = q["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        let expected = format!("{} meaning", q["question"].as_str().unwrap());
        assert_eq!(options.iter().filter(|o| **o == expected.as_str()).count(), 1);
    }

    ctx.cleanup().await;
}

/// Test answering rewards correct choices only, and the leaderboard follows coins.
#[tokio::test]
#[ignore = "requires database"]
async fn test_quiz_answers_and_leaderboard() {
    let mut ctx = TestContext::new().await;
    let server = ctx.server();
    let student = ctx.create_user(Role::Student).await;
    let (set, _) = ctx.create_set_with_cards(&["alpha", "beta"]).await;
    let auth = TestContext::auth_header_value(&student.token);

    let quiz: serde_json::Value = server
        .get(&format!("/api/quiz?set_id={}&seed=3", set.id))
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    let first = &quiz["questions"][0];
    let second = &quiz["questions"][1];
    let card_id = |q: &serde_json::Value| q["card_id"].as_str().unwrap().parse::<Uuid>().unwrap();
    let meaning = |q: &serde_json::Value| format!("{} meaning", q["question"].as_str().unwrap());

    let wrong: serde_json::Value = server
        .post("/api/quiz/answer")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&fixtures::quiz_answer_request(card_id(first), "no such meaning"))
        .await
        .json();
    assert_eq!(wrong["correct"], false);
    assert_eq!(wrong["answer"], meaning(first));
    assert_eq!(wrong["coins_awarded"], 0);
    assert_eq!(wrong["finished"], false);

    let right: serde_json::Value = server
        .post("/api/quiz/answer")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&fixtures::quiz_answer_request(card_id(second), &meaning(second)))
        .await
        .json();
    assert_eq!(right["correct"], true);
    assert_eq!(right["coins"], 10);
    assert_eq!(right["score"], 1);
    assert_eq!(right["finished"], true);

    let me: serde_json::Value = server
        .get("/api/me")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(me["correct"], 1);

    let board: serde_json::Value = server
        .get("/api/leaderboard")
        .add_header(AUTHORIZATION, auth)
        .await
        .json();
    let entries = board.as_array().unwrap();
    let coins: Vec<i64> = entries.iter().map(|e| e["coins"].as_i64().unwrap()).collect();
    assert!(coins.windows(2).all(|w| w[0] >= w[1]));
    assert!(entries
        .iter()
        .any(|e| e["user_id"] == student.id.to_string() && e["coins"] == 10));

    ctx.cleanup().await;
}

/// Test each question pays out once and only the current question can be answered.
#[tokio::test]
#[ignore = "requires database"]
async fn test_quiz_answers_are_single_use() {
    let mut ctx = TestContext::new().await;
    let server = ctx.server();
    let student = ctx.create_user(Role::Student).await;
    let (set, _) = ctx.create_set_with_cards(&["alpha", "beta", "gamma"]).await;
    let auth = TestContext::auth_header_value(&student.token);

    // No quiz generated yet
    server
        .post("/api/quiz/answer")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&fixtures::quiz_answer_request(Uuid::new_v4(), "anything"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let quiz: serde_json::Value = server
        .get(&format!("/api/quiz?set_id={}&seed=11", set.id))
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    let questions = quiz["questions"].as_array().unwrap();
    let answer_for = |i: usize| {
        let q = &questions[i];
        fixtures::quiz_answer_request(
            q["card_id"].as_str().unwrap().parse().unwrap(),
            &format!("{} meaning", q["question"].as_str().unwrap()),
        )
    };

    // Skipping ahead is rejected
    server
        .post("/api/quiz/answer")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&answer_for(1))
        .await
        .assert_status(StatusCode::CONFLICT);

    let first: serde_json::Value = server
        .post("/api/quiz/answer")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&answer_for(0))
        .await
        .json();
    assert_eq!(first["coins"], 10);

    // Answering the same question again earns nothing
    server
        .post("/api/quiz/answer")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&answer_for(0))
        .await
        .assert_status(StatusCode::CONFLICT);

    let me: serde_json::Value = server
        .get("/api/me")
        .add_header(AUTHORIZATION, auth)
        .await
        .json();
    assert_eq!(me["coins"], 10);
    assert_eq!(me["correct"], 1);

    ctx.cleanup().await;
}

/// Test a study session adds time on stop; stopping again is a no-op.
#[tokio::test]
#[ignore = "requires database"]
async fn test_study_session() {
    let mut ctx = TestContext::new().await;
    let server = ctx.server();
    let student = ctx.create_user(Role::Student).await;
    let auth = TestContext::auth_header_value(&student.token);

    let started: serde_json::Value = server
        .post("/api/session/start")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(started["started"], true);

    let again: serde_json::Value = server
        .post("/api/session/start")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(again["started"], false);

    let beat: serde_json::Value = server
        .post("/api/session/heartbeat")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(beat["running"], true);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let stopped: serde_json::Value = server
        .post("/api/session/stop")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(stopped["stopped"], true);
    let session_ms = stopped["session_ms"].as_i64().unwrap();
    assert!(session_ms >= 50);

    let me: serde_json::Value = server
        .get("/api/me")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(me["time_ms"].as_i64().unwrap(), session_ms);

    let idle: serde_json::Value = server
        .post("/api/session/stop")
        .add_header(AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(idle["stopped"], false);
    assert_eq!(idle["session_ms"], 0);

    let beat: serde_json::Value = server
        .post("/api/session/heartbeat")
        .add_header(AUTHORIZATION, auth)
        .await
        .json();
    assert_eq!(beat["running"], false);

    ctx.cleanup().await;
}
