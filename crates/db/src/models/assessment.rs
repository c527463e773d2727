//! BEEP assessment entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use starthub_core::types::{DbId, Timestamp};

/// A row from the `beep_assessments` table.
///
/// `final_score` and `maturity_level` are both `None` while the assessment
/// is a draft and both set once it is completed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: DbId,
    pub user_id: DbId,
    pub company_id: Option<DbId>,
    pub status: String,
    pub final_score: Option<f64>,
    pub maturity_level: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for starting a new draft assessment. The owner comes from the auth token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssessment {
    pub company_id: Option<DbId>,
}
