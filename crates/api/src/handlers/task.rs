//! Handlers for tasks nested under `/projects/{project_id}/tasks`.
//!
//! Every mutation re-derives the parent project's status from its tasks and
//! persists the result when it changes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use starthub_core::error::CoreError;
use starthub_core::project_status::{derive_status, validate_task_status, ProjectStatus};
use starthub_core::types::DbId;
use starthub_db::models::task::{CreateTask, Task, UpdateTask};
use starthub_db::repositories::{ProjectRepo, TaskRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::project::{find_project, task_statuses};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A task together with its project's status after the mutation.
#[derive(Debug, Serialize)]
pub struct TaskMutation {
    pub task: Task,
    pub project_status: String,
}

fn task_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Task", id })
}

/// Re-derive and persist the project status. Returns the status now stored.
async fn sync_project_status(state: &AppState, project_id: DbId) -> AppResult<String> {
    let project = find_project(state, project_id).await?;
    let current = ProjectStatus::from_str_value(&project.status)?;
    let statuses = task_statuses(state, project_id).await?;

    let Some(next) = derive_status(current, &statuses) else {
        return Ok(project.status);
    };

    let Some(updated) = ProjectRepo::update_status(&state.pool, project_id, current, next).await?
    else {
        // The status changed since it was read; the newer value stands.
        let project = find_project(state, project_id).await?;
        tracing::debug!(
            project_id,
            expected = current.as_str(),
            found = %project.status,
            "Project status changed concurrently, derived status skipped"
        );
        return Ok(project.status);
    };

    tracing::info!(
        project_id,
        from = current.as_str(),
        to = next.as_str(),
        "Project status derived from tasks"
    );
    Ok(updated.status)
}

/// GET /api/v1/projects/{project_id}/tasks
pub async fn list_by_project(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    find_project(&state, project_id).await?;
    let tasks = TaskRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// POST /api/v1/projects/{project_id}/tasks
pub async fn create(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<TaskMutation>>)> {
    input.validate()?;
    if let Some(status) = &input.status {
        validate_task_status(status)?;
    }
    find_project(&state, project_id).await?;

    let task = TaskRepo::create(&state.pool, project_id, &input).await?;
    let project_status = sync_project_status(&state, project_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TaskMutation {
                task,
                project_status,
            },
        }),
    ))
}

/// GET /api/v1/projects/{project_id}/tasks/{id}
pub async fn get_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Task>>> {
    let task = TaskRepo::find_by_id(&state.pool, project_id, id)
        .await?
        .ok_or_else(|| task_not_found(id))?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /api/v1/projects/{project_id}/tasks/{id}
pub async fn update(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<TaskMutation>>> {
    input.validate()?;
    if let Some(status) = &input.status {
        validate_task_status(status)?;
    }

    let task = TaskRepo::update(&state.pool, project_id, id, &input)
        .await?
        .ok_or_else(|| task_not_found(id))?;
    let project_status = sync_project_status(&state, project_id).await?;

    Ok(Json(DataResponse {
        data: TaskMutation {
            task,
            project_status,
        },
    }))
}

/// DELETE /api/v1/projects/{project_id}/tasks/{id}
pub async fn delete(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if !TaskRepo::delete(&state.pool, project_id, id).await? {
        return Err(task_not_found(id));
    }
    sync_project_status(&state, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
