//! BEEP answer entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use starthub_core::types::{DbId, Timestamp};

/// A row from the `beep_answers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Answer {
    pub id: DbId,
    pub assessment_id: DbId,
    pub question_id: DbId,
    pub value: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for recording a single answer.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAnswer {
    pub value: i16,
}

/// An answer joined to its question's subcategory and category.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerWithGroup {
    pub question_id: DbId,
    pub subcategory_id: DbId,
    pub category_id: DbId,
    pub value: i16,
}
