//! Repository for the `tasks` table.

use sqlx::PgPool;
use starthub_core::project_status::TASK_TODO;
use starthub_core::types::DbId;

use crate::models::task::{CreateTask, Task, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, title, description, status, assignee_id, due_date, \
                       sort_order, created_at, updated_at";

/// Provides CRUD operations for tasks, scoped to their project.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task under `project_id`.
    ///
    /// If `status` is `None` in the input, defaults to `todo`.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (project_id, title, description, status, assignee_id, due_date, sort_order) \
             VALUES ($1, $2, $3, COALESCE($4, '{TASK_TODO}'), $5, $6, COALESCE($7, 0)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.assignee_id)
            .bind(input.due_date)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Find a task by ID within a project.
    pub async fn find_by_id(
        pool: &PgPool,
        project_id: DbId,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND project_id = $2");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's tasks in board order.
    pub async fn list_by_project(pool: &PgPool, project_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Status strings of every task in a project.
    pub async fn statuses_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT status FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// Update a task. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no such task exists in the project.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                status = COALESCE($5, status), \
                assignee_id = COALESCE($6, assignee_id), \
                due_date = COALESCE($7, due_date), \
                sort_order = COALESCE($8, sort_order) \
             WHERE id = $1 AND project_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.assignee_id)
            .bind(input.due_date)
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Delete a task. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, project_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
