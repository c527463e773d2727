//! Handlers for BEEP assessments, answers, scoring and completion.
//!
//! Every handler is scoped to the authenticated user: an assessment owned by
//! someone else is reported as not found.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use starthub_core::beep::{
    self, AssessmentStatus, GroupScore, MaturityLevel, Progress, Rating, ScoreDenominator,
};
use starthub_core::error::CoreError;
use starthub_core::types::DbId;
use starthub_db::models::answer::{Answer, UpsertAnswer};
use starthub_db::models::assessment::{Assessment, CreateAssessment};
use starthub_db::repositories::{AnswerRepo, AssessmentRepo, CatalogueRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body for the auto-save endpoint.
#[derive(Debug, Deserialize)]
pub struct AutosaveAnswer {
    pub question_id: DbId,
    pub value: i16,
}

/// Query parameters for the score preview.
#[derive(Debug, Deserialize)]
pub struct ScoreParams {
    pub denominator: Option<ScoreDenominator>,
}

/// Score preview of an assessment.
#[derive(Debug, Serialize)]
pub struct ScorePreview {
    pub denominator: ScoreDenominator,
    pub score: f64,
    pub display_score: f64,
    pub maturity_level: MaturityLevel,
    pub maturity_label: &'static str,
    pub progress: Progress,
    pub categories: Vec<GroupScore>,
    pub subcategories: Vec<GroupScore>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an assessment owned by `user_id` or fail with 404.
async fn find_owned(state: &AppState, id: DbId, user_id: DbId) -> AppResult<Assessment> {
    AssessmentRepo::find_for_user(&state.pool, id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BeepAssessment",
            id,
        }))
}

fn status_of(assessment: &Assessment) -> AppResult<AssessmentStatus> {
    AssessmentStatus::from_str_value(&assessment.status).map_err(AppError::Core)
}

/// Load an owned assessment that still accepts answers.
async fn find_owned_draft(state: &AppState, id: DbId, user_id: DbId) -> AppResult<Assessment> {
    let assessment = find_owned(state, id, user_id).await?;
    if status_of(&assessment)? == AssessmentStatus::Completed {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Assessment {id} is already completed"
        ))));
    }
    Ok(assessment)
}

/// Ensure the question exists and belongs to the active catalogue.
async fn ensure_active_question(state: &AppState, question_id: DbId) -> AppResult<()> {
    let question = CatalogueRepo::find_question(&state.pool, question_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BeepQuestion",
            id: question_id,
        }))?;
    if !question.is_active {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Question {question_id} is no longer part of the catalogue"
        ))));
    }
    Ok(())
}

async fn load_progress(state: &AppState, assessment_id: DbId) -> AppResult<Progress> {
    let total = CatalogueRepo::count_active_questions(&state.pool).await?;
    let answered = AnswerRepo::count_answered(&state.pool, assessment_id).await?;
    Ok(beep::compute_progress(total, answered))
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// POST /api/v1/beep/assessments
///
/// Start a draft. If the user already has a draft for the same company it is
/// returned with 200 instead of creating a second one.
pub async fn start(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateAssessment>,
) -> AppResult<(StatusCode, Json<DataResponse<Assessment>>)> {
    if let Some(existing) =
        AssessmentRepo::find_active_draft(&state.pool, auth.user_id, input.company_id).await?
    {
        return Ok((StatusCode::OK, Json(DataResponse { data: existing })));
    }

    let assessment =
        AssessmentRepo::create_draft(&state.pool, auth.user_id, input.company_id).await?;

    tracing::info!(
        user_id = auth.user_id,
        assessment_id = assessment.id,
        company_id = ?input.company_id,
        "BEEP assessment started"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: assessment })))
}

/// GET /api/v1/beep/assessments
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Assessment>>>> {
    let assessments = AssessmentRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: assessments }))
}

/// GET /api/v1/beep/assessments/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Assessment>>> {
    let assessment = find_owned(&state, id, auth.user_id).await?;
    Ok(Json(DataResponse { data: assessment }))
}

/// DELETE /api/v1/beep/assessments/{id}
///
/// Discard a draft and its answers. Completed assessments are kept (409).
pub async fn discard(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned_draft(&state, id, auth.user_id).await?;

    state.autosave.flush(id).await;
    if AssessmentRepo::delete_draft(&state.pool, id, auth.user_id).await? {
        tracing::info!(user_id = auth.user_id, assessment_id = id, "BEEP draft discarded");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::Conflict(format!(
            "Assessment {id} is no longer a draft"
        ))))
    }
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// GET /api/v1/beep/assessments/{id}/answers
pub async fn list_answers(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Answer>>>> {
    find_owned(&state, id, auth.user_id).await?;
    let answers = AnswerRepo::list_by_assessment(&state.pool, id).await?;
    Ok(Json(DataResponse { data: answers }))
}

/// PUT /api/v1/beep/assessments/{id}/answers/{question_id}
///
/// Record or overwrite one answer. `ON CONFLICT` makes repeated and
/// concurrent writes of the same question plain overwrites.
pub async fn upsert_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, question_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpsertAnswer>,
) -> AppResult<Json<DataResponse<Answer>>> {
    let rating = Rating::new(input.value)?;
    find_owned_draft(&state, id, auth.user_id).await?;
    ensure_active_question(&state, question_id).await?;

    let answer = AnswerRepo::upsert(&state.pool, id, question_id, rating)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Assessment {id} no longer accepts answers"
            )))
        })?;

    Ok(Json(DataResponse { data: answer }))
}

/// POST /api/v1/beep/assessments/{id}/answers/autosave
///
/// Queue a debounced write. Returns 202 before the write happens.
pub async fn autosave_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AutosaveAnswer>,
) -> AppResult<StatusCode> {
    let rating = Rating::new(input.value)?;
    find_owned_draft(&state, id, auth.user_id).await?;
    ensure_active_question(&state, input.question_id).await?;

    state.autosave.schedule(id, input.question_id, rating);
    Ok(StatusCode::ACCEPTED)
}

// ---------------------------------------------------------------------------
// Progress and scoring
// ---------------------------------------------------------------------------

/// GET /api/v1/beep/assessments/{id}/progress
pub async fn progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Progress>>> {
    find_owned(&state, id, auth.user_id).await?;
    let progress = load_progress(&state, id).await?;
    Ok(Json(DataResponse { data: progress }))
}

/// GET /api/v1/beep/assessments/{id}/score?denominator=answered|catalogue
///
/// Preview score with per-category and per-subcategory sub-scores.
pub async fn score(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ScoreParams>,
) -> AppResult<Json<DataResponse<ScorePreview>>> {
    find_owned(&state, id, auth.user_id).await?;

    let denominator = params.denominator.unwrap_or_default();
    let progress = load_progress(&state, id).await?;
    let answers = AnswerRepo::fetch_answer_set(&state.pool, id).await?;
    let total = usize::try_from(progress.total).unwrap_or(0);
    let score = beep::preview_score(&answers, total, denominator);
    let maturity_level = beep::classify(score);

    let grouped = AnswerRepo::list_with_groups(&state.pool, id).await?;
    let mut by_category = Vec::with_capacity(grouped.len());
    let mut by_subcategory = Vec::with_capacity(grouped.len());
    for row in &grouped {
        let rating = Rating::new(row.value)?;
        by_category.push((row.category_id, rating));
        by_subcategory.push((row.subcategory_id, rating));
    }

    Ok(Json(DataResponse {
        data: ScorePreview {
            denominator,
            score,
            display_score: beep::round_for_display(score),
            maturity_level,
            maturity_label: maturity_level.label(),
            progress,
            categories: beep::compute_group_scores(&by_category),
            subcategories: beep::compute_group_scores(&by_subcategory),
        },
    }))
}

/// POST /api/v1/beep/assessments/{id}/complete
///
/// Score the full answer set and move the assessment to `completed`.
/// Requires every active catalogue question to be answered. The assessment
/// row is locked for the duration so no answer can change mid-scoring.
pub async fn complete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Assessment>>> {
    find_owned_draft(&state, id, auth.user_id).await?;
    state.autosave.flush(id).await;

    let mut tx = state.pool.begin().await?;

    let locked = AssessmentRepo::lock_for_user(&mut *tx, id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "BeepAssessment",
            id,
        }))?;
    if status_of(&locked)? == AssessmentStatus::Completed {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Assessment {id} is already completed"
        ))));
    }

    let total = CatalogueRepo::count_active_questions(&mut *tx).await?;
    let answered = AnswerRepo::count_answered(&mut *tx, id).await?;
    beep::ensure_completable(&beep::compute_progress(total, answered))?;

    let answers = AnswerRepo::fetch_answer_set(&mut *tx, id).await?;
    let result = beep::score_assessment(&answers);

    let completed = AssessmentRepo::complete(&mut *tx, id, &result, chrono::Utc::now())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "Assessment {id} is already completed"
            )))
        })?;

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        assessment_id = id,
        final_score = result.final_score,
        maturity_level = result.maturity_level.as_str(),
        "BEEP assessment completed"
    );

    Ok(Json(DataResponse { data: completed }))
}
