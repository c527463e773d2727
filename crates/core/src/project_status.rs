//! Project and task status enums plus automatic project status derivation.
//!
//! [`derive_status`] proposes a new project status after the project's
//! tasks change. It only ever moves a project forward from `planning` or
//! `active`; manually set `on_hold`, `cancelled` and `completed` statuses are
//! left alone.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PROJECT_PLANNING: &str = "planning";
pub const PROJECT_ACTIVE: &str = "active";
pub const PROJECT_ON_HOLD: &str = "on_hold";
pub const PROJECT_COMPLETED: &str = "completed";
pub const PROJECT_CANCELLED: &str = "cancelled";

/// All valid project status strings.
pub const VALID_PROJECT_STATUSES: &[&str] = &[
    PROJECT_PLANNING,
    PROJECT_ACTIVE,
    PROJECT_ON_HOLD,
    PROJECT_COMPLETED,
    PROJECT_CANCELLED,
];

pub const TASK_TODO: &str = "todo";
pub const TASK_IN_PROGRESS: &str = "in_progress";
pub const TASK_REVIEW: &str = "review";
pub const TASK_DONE: &str = "done";

/// All valid task status strings, in board column order.
pub const VALID_TASK_STATUSES: &[&str] = &[TASK_TODO, TASK_IN_PROGRESS, TASK_REVIEW, TASK_DONE];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            PROJECT_PLANNING => Ok(Self::Planning),
            PROJECT_ACTIVE => Ok(Self::Active),
            PROJECT_ON_HOLD => Ok(Self::OnHold),
            PROJECT_COMPLETED => Ok(Self::Completed),
            PROJECT_CANCELLED => Ok(Self::Cancelled),
            _ => Err(CoreError::Validation(format!(
                "Invalid project status '{s}'. Must be one of: {}",
                VALID_PROJECT_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => PROJECT_PLANNING,
            Self::Active => PROJECT_ACTIVE,
            Self::OnHold => PROJECT_ON_HOLD,
            Self::Completed => PROJECT_COMPLETED,
            Self::Cancelled => PROJECT_CANCELLED,
        }
    }

    /// Statuses that only a person may change.
    pub fn is_manual_hold(&self) -> bool {
        matches!(self, Self::OnHold | Self::Cancelled | Self::Completed)
    }
}

/// Kanban column of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            TASK_TODO => Ok(Self::Todo),
            TASK_IN_PROGRESS => Ok(Self::InProgress),
            TASK_REVIEW => Ok(Self::Review),
            TASK_DONE => Ok(Self::Done),
            _ => Err(CoreError::Validation(format!(
                "Invalid task status '{s}'. Must be one of: {}",
                VALID_TASK_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => TASK_TODO,
            Self::InProgress => TASK_IN_PROGRESS,
            Self::Review => TASK_REVIEW,
            Self::Done => TASK_DONE,
        }
    }
}

/// Validate a project status string.
pub fn validate_project_status(s: &str) -> Result<(), CoreError> {
    ProjectStatus::from_str_value(s).map(|_| ())
}

/// Validate a task status string.
pub fn validate_task_status(s: &str) -> Result<(), CoreError> {
    TaskStatus::from_str_value(s).map(|_| ())
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Propose a new project status from its tasks' statuses.
///
/// Returns `None` when the status should stay as it is:
/// - no tasks,
/// - the project is `on_hold`, `cancelled` or already `completed`,
/// - the candidate equals the current status.
///
/// Otherwise all-done proposes `completed`, and any started task on a
/// `planning` project proposes `active`.
pub fn derive_status(current: ProjectStatus, tasks: &[TaskStatus]) -> Option<ProjectStatus> {
    if tasks.is_empty() || current.is_manual_hold() {
        return None;
    }

    let candidate = if tasks.iter().all(|t| *t == TaskStatus::Done) {
        ProjectStatus::Completed
    } else if current == ProjectStatus::Planning && tasks.iter().any(|t| *t != TaskStatus::Todo) {
        ProjectStatus::Active
    } else {
        return None;
    };

    (candidate != current).then_some(candidate)
}

// ---------------------------------------------------------------------------
// Board summary
// ---------------------------------------------------------------------------

/// Task counts per column for a project board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
    pub completion_pct: u8,
}

/// Count tasks per status. `completion_pct` is 0 for an empty board.
pub fn summarize_tasks(tasks: &[TaskStatus]) -> TaskSummary {
    let mut summary = TaskSummary {
        total: tasks.len(),
        ..TaskSummary::default()
    };
    for task in tasks {
        match task {
            TaskStatus::Todo => summary.todo += 1,
            TaskStatus::InProgress => summary.in_progress += 1,
            TaskStatus::Review => summary.review += 1,
            TaskStatus::Done => summary.done += 1,
        }
    }
    if summary.total > 0 {
        summary.completion_pct =
            (summary.done as f64 / summary.total as f64 * 100.0).round() as u8;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    use ProjectStatus as P;
    use TaskStatus as T;

    #[test]
    fn no_tasks_no_change() {
        assert_eq!(derive_status(P::Planning, &[]), None);
        assert_eq!(derive_status(P::Active, &[]), None);
    }

    #[test]
    fn all_done_completes_planning_project() {
        assert_eq!(derive_status(P::Planning, &[T::Done, T::Done]), Some(P::Completed));
    }

    #[test]
    fn all_done_completes_active_project() {
        assert_eq!(derive_status(P::Active, &[T::Done]), Some(P::Completed));
    }

    #[test]
    fn started_work_activates_planning_project() {
        assert_eq!(derive_status(P::Planning, &[T::Todo, T::InProgress]), Some(P::Active));
        assert_eq!(derive_status(P::Planning, &[T::Review]), Some(P::Active));
        assert_eq!(derive_status(P::Planning, &[T::Todo, T::Done]), Some(P::Active));
    }

    #[test]
    fn only_todo_tasks_leave_planning() {
        assert_eq!(derive_status(P::Planning, &[T::Todo, T::Todo]), None);
    }

    #[test]
    fn active_project_with_open_work_unchanged() {
        assert_eq!(derive_status(P::Active, &[T::Todo, T::InProgress]), None);
    }

    #[test]
    fn on_hold_is_never_changed() {
        assert_eq!(derive_status(P::OnHold, &[T::Done]), None);
        assert_eq!(derive_status(P::OnHold, &[T::InProgress]), None);
    }

    #[test]
    fn cancelled_is_never_changed() {
        assert_eq!(derive_status(P::Cancelled, &[T::Done, T::Done]), None);
    }

    #[test]
    fn completed_is_not_reopened() {
        assert_eq!(derive_status(P::Completed, &[T::Todo]), None);
        assert_eq!(derive_status(P::Completed, &[T::Done]), None);
    }

    #[test]
    fn status_string_conversion() {
        for s in VALID_PROJECT_STATUSES {
            assert_eq!(P::from_str_value(s).unwrap().as_str(), *s);
        }
        for s in VALID_TASK_STATUSES {
            assert_eq!(T::from_str_value(s).unwrap().as_str(), *s);
        }
        assert!(validate_project_status("archived").is_err());
        assert!(validate_task_status("blocked").is_err());
        assert!(validate_task_status("in_progress").is_ok());
    }

    #[test]
    fn summary_counts_columns() {
        let summary = summarize_tasks(&[T::Todo, T::Done, T::Done, T::Review]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.todo, 1);
        assert_eq!(summary.review, 1);
        assert_eq!(summary.done, 2);
        assert_eq!(summary.completion_pct, 50);
    }

    #[test]
    fn summary_of_empty_board() {
        assert_eq!(summarize_tasks(&[]), TaskSummary::default());
    }
}
