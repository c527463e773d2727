//! HTTP-level integration tests for BEEP assessments.
//!
//! Covers the draft lifecycle, answer validation, user scoping, the score
//! preview and the completion gate.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, delete, get, get_anonymous, post_json, put_json, seed_catalogue, token_for};
use sqlx::PgPool;
use starthub_core::beep::Rating;
use starthub_db::repositories::AnswerRepo;

const USER: i64 = 7;
const OTHER_USER: i64 = 8;

async fn start_assessment(pool: &PgPool, token: &str) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/beep/assessments", token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Write a rating for every question directly through the repository.
async fn answer_all(pool: &PgPool, assessment_id: i64, questions: &[i64], value: i16) {
    let rating = Rating::new(value).unwrap();
    for &question_id in questions {
        AnswerRepo::upsert(pool, assessment_id, question_id, rating)
            .await
            .unwrap()
            .unwrap();
    }
}

// ---------------------------------------------------------------------------
// Catalogue and drafts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn catalogue_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_anonymous(app, "/api/v1/beep/catalogue").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn catalogue_returns_nested_tree(pool: PgPool) {
    seed_catalogue(&pool, 2, 3).await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/beep/catalogue", &token_for(USER)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let categories = json["data"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["name"], "Category 0");
    let questions = categories[0]["subcategories"][0]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn starting_twice_reuses_the_draft(pool: PgPool) {
    let token = token_for(USER);
    let first = start_assessment(&pool, &token).await;

    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/beep/assessments", &token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], first);
    assert_eq!(json["data"]["status"], "draft");
    assert!(json["data"]["final_score"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn assessments_are_scoped_to_their_owner(pool: PgPool) {
    let id = start_assessment(&pool, &token_for(USER)).await;

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/beep/assessments/{id}"), &token_for(OTHER_USER)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/beep/assessments", &token_for(OTHER_USER)).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn answer_upsert_overwrites_previous_value(pool: PgPool) {
    let questions = seed_catalogue(&pool, 1, 2).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    let uri = format!("/api/v1/beep/assessments/{id}/answers/{}", questions[0]);

    let app = common::build_test_app(pool.clone());
    let response = put_json(app, &uri, &token, serde_json::json!({"value": 2})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let response = put_json(app, &uri, &token, serde_json::json!({"value": 5})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["value"], 5);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/beep/assessments/{id}/answers"), &token).await;
    let json = body_json(response).await;
    let answers = json["data"].as_array().unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0]["value"], 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn out_of_range_rating_is_rejected(pool: PgPool) {
    let questions = seed_catalogue(&pool, 1, 1).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    let uri = format!("/api/v1/beep/assessments/{id}/answers/{}", questions[0]);

    for value in [0, 6] {
        let app = common::build_test_app(pool.clone());
        let response = put_json(app, &uri, &token, serde_json::json!({"value": value})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn answering_unknown_question_returns_404(pool: PgPool) {
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;

    let app = common::build_test_app(pool);
    let response = put_json(
        app,
        &format!("/api/v1/beep/assessments/{id}/answers/999999"),
        &token,
        serde_json::json!({"value": 3}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn autosave_is_written_after_debounce(pool: PgPool) {
    let questions = seed_catalogue(&pool, 1, 2).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/beep/assessments/{id}/answers/autosave"),
        &token,
        serde_json::json!({"question_id": questions[1], "value": 4}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let mut answered = 0;
    for _ in 0..50 {
        answered = AnswerRepo::count_answered(&pool, id).await.unwrap();
        if answered == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(answered, 1);
}

// ---------------------------------------------------------------------------
// Progress and score preview
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn progress_and_score_preview(pool: PgPool) {
    let questions = seed_catalogue(&pool, 2, 2).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    answer_all(&pool, id, &questions[..1], 4).await;
    answer_all(&pool, id, &questions[1..2], 2).await;

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/beep/assessments/{id}/progress"), &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["answered"], 2);
    assert_eq!(json["data"]["total"], 4);
    assert_eq!(json["data"]["percentage"], 50);

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/beep/assessments/{id}/score"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["denominator"], "answered");
    assert_eq!(json["data"]["score"], 3.0);
    assert_eq!(json["data"]["maturity_level"], "iniciando_negocio");
    assert_eq!(json["data"]["categories"].as_array().unwrap().len(), 1);

    let app = common::build_test_app(pool);
    let response = get(
        app,
        &format!("/api/v1/beep/assessments/{id}/score?denominator=catalogue"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["denominator"], "catalogue");
    assert_eq!(json["data"]["score"], 1.5);
    assert_eq!(json["data"]["maturity_level"], "idealizando");
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_with_missing_answers_is_rejected(pool: PgPool) {
    let questions = seed_catalogue(&pool, 1, 3).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    answer_all(&pool, id, &questions[..2], 5).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/beep/assessments/{id}/complete"),
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/beep/assessments/{id}"), &token).await;
    assert_eq!(body_json(response).await["data"]["status"], "draft");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_full_catalogue_scores_and_classifies(pool: PgPool) {
    let questions = seed_catalogue(&pool, 4, 25).await;
    assert_eq!(questions.len(), 100);
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    answer_all(&pool, id, &questions, 4).await;

    let app = common::build_test_app(pool.clone());
    let uri = format!("/api/v1/beep/assessments/{id}/complete");
    let response = post_json(app, &uri, &token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["final_score"], 4.0);
    assert_eq!(json["data"]["maturity_level"], "validando_mercado");
    assert!(json["data"]["completed_at"].is_string());

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/beep/assessments/{id}"), &token).await;
    let refetched = body_json(response).await;
    assert_eq!(refetched["data"]["final_score"], json["data"]["final_score"]);
    assert_eq!(refetched["data"]["completed_at"], json["data"]["completed_at"]);

    // A completed assessment is frozen.
    let app = common::build_test_app(pool.clone());
    let response = post_json(app, &uri, &token, serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &format!("/api/v1/beep/assessments/{id}/answers/{}", questions[0]),
        &token,
        serde_json::json!({"value": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let app = common::build_test_app(pool);
    let response = delete(app, &format!("/api/v1/beep/assessments/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completion_flushes_pending_autosaves(pool: PgPool) {
    let questions = seed_catalogue(&pool, 1, 2).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    answer_all(&pool, id, &questions[..1], 5).await;

    // One router so the queued write and the completion share a queue.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app.clone(),
        &format!("/api/v1/beep/assessments/{id}/answers/autosave"),
        &token,
        serde_json::json!({"question_id": questions[1], "value": 5}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = post_json(
        app,
        &format!("/api/v1/beep/assessments/{id}/complete"),
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["final_score"], 5.0);
    assert_eq!(json["data"]["maturity_level"], "evoluindo");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn discarding_a_draft_removes_it(pool: PgPool) {
    let questions = seed_catalogue(&pool, 1, 1).await;
    let token = token_for(USER);
    let id = start_assessment(&pool, &token).await;
    answer_all(&pool, id, &questions, 3).await;

    let app = common::build_test_app(pool.clone());
    let response = delete(app, &format!("/api/v1/beep/assessments/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/beep/assessments/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(AnswerRepo::count_answered(&pool, id).await.unwrap(), 0);
}
