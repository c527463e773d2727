//! Route definitions for the `/beep` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{beep, catalogue};
use crate::state::AppState;

/// Routes mounted at `/beep`.
///
/// ```text
/// GET    /catalogue                                  -> get_catalogue
/// GET    /assessments                                -> list
/// POST   /assessments                                -> start
/// GET    /assessments/{id}                           -> get_by_id
/// DELETE /assessments/{id}                           -> discard
/// GET    /assessments/{id}/answers                   -> list_answers
/// PUT    /assessments/{id}/answers/{question_id}     -> upsert_answer
/// POST   /assessments/{id}/answers/autosave          -> autosave_answer
/// GET    /assessments/{id}/progress                  -> progress
/// GET    /assessments/{id}/score                     -> score
/// POST   /assessments/{id}/complete                  -> complete
/// ```
pub fn router() -> Router<AppState> {
    let assessment_routes = Router::new()
        .route("/", get(beep::list).post(beep::start))
        .route("/{id}", get(beep::get_by_id).delete(beep::discard))
        .route("/{id}/answers", get(beep::list_answers))
        .route("/{id}/answers/autosave", post(beep::autosave_answer))
        .route("/{id}/answers/{question_id}", put(beep::upsert_answer))
        .route("/{id}/progress", get(beep::progress))
        .route("/{id}/score", get(beep::score))
        .route("/{id}/complete", post(beep::complete));

    Router::new()
        .route("/catalogue", get(catalogue::get_catalogue))
        .nest("/assessments", assessment_routes)
}
