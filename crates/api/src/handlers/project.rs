//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use starthub_core::error::CoreError;
use starthub_core::project_status::{self, validate_project_status, TaskStatus, TaskSummary};
use starthub_core::types::DbId;
use starthub_db::models::project::{CreateProject, Project, UpdateProject};
use starthub_db::repositories::{ProjectRepo, TaskRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn project_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}

/// Load a project or fail with 404.
pub(crate) async fn find_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| project_not_found(id))
}

/// Load the parsed statuses of a project's tasks.
pub(crate) async fn task_statuses(state: &AppState, project_id: DbId) -> AppResult<Vec<TaskStatus>> {
    TaskRepo::statuses_for_project(&state.pool, project_id)
        .await?
        .iter()
        .map(|s| TaskStatus::from_str_value(s).map_err(AppError::Core))
        .collect()
}

/// POST /api/v1/projects
///
/// `owner_id` defaults to the caller.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }
    input.owner_id.get_or_insert(auth.user_id);

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, user_id = auth.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_project(&state, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
///
/// A status set here is a manual decision and is stored as given.
pub async fn update(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    input.validate()?;
    if let Some(status) = &input.status {
        validate_project_status(status)?;
    }

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| project_not_found(id))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ProjectRepo::delete(&state.pool, id).await? {
        tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(project_not_found(id))
    }
}

/// GET /api/v1/projects/{id}/tasks/summary
pub async fn task_summary(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskSummary>>> {
    find_project(&state, id).await?;
    let statuses = task_statuses(&state, id).await?;
    Ok(Json(DataResponse {
        data: project_status::summarize_tasks(&statuses),
    }))
}
