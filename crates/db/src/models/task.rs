//! Task entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use starthub_core::types::{DbId, Timestamp};
use validator::Validate;

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub assignee_id: Option<DbId>,
    pub due_date: Option<NaiveDate>,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a task. `project_id` comes from the URL path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `todo` if omitted.
    pub status: Option<String>,
    pub assignee_id: Option<DbId>,
    pub due_date: Option<NaiveDate>,
    pub sort_order: Option<i32>,
}

/// DTO for updating a task. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assignee_id: Option<DbId>,
    pub due_date: Option<NaiveDate>,
    pub sort_order: Option<i32>,
}
