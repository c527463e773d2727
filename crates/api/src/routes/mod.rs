pub mod beep;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /beep/catalogue                                  question catalogue tree
/// /beep/assessments                                list, start
/// /beep/assessments/{id}                           get, discard draft
/// /beep/assessments/{id}/answers                   list answers
/// /beep/assessments/{id}/answers/{question_id}     upsert answer (PUT)
/// /beep/assessments/{id}/answers/autosave          debounced upsert (POST)
/// /beep/assessments/{id}/progress                  answered / total
/// /beep/assessments/{id}/score                     preview score (GET)
/// /beep/assessments/{id}/complete                  score and complete (POST)
///
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/tasks/summary                     board counts
/// /projects/{project_id}/tasks                     list, create
/// /projects/{project_id}/tasks/{id}                get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/beep", beep::router())
        .nest("/projects", project::router())
}
