//! Handler for the read-only BEEP question catalogue.

use axum::extract::State;
use axum::Json;
use starthub_db::models::catalogue::{build_catalogue_tree, CategoryNode};
use starthub_db::repositories::CatalogueRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/beep/catalogue
///
/// Categories -> subcategories -> active questions, in display order.
pub async fn get_catalogue(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CategoryNode>>>> {
    let categories = CatalogueRepo::list_categories(&state.pool).await?;
    let subcategories = CatalogueRepo::list_subcategories(&state.pool).await?;
    let questions = CatalogueRepo::list_active_questions(&state.pool).await?;

    Ok(Json(DataResponse {
        data: build_catalogue_tree(categories, subcategories, questions),
    }))
}
