//! Repository for the `beep_answers` table.

use sqlx::{PgExecutor, PgPool};
use starthub_core::beep::{AnswerSet, Rating, STATUS_DRAFT};
use starthub_core::types::DbId;

use crate::models::answer::{Answer, AnswerWithGroup};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, assessment_id, question_id, value, created_at, updated_at";

/// Provides answer storage with one row per (assessment, question).
pub struct AnswerRepo;

impl AnswerRepo {
    /// Insert or overwrite the answer for `(assessment_id, question_id)`.
    ///
    /// Only writes while the assessment is a draft; returns `None` otherwise
    /// (including when the assessment does not exist). The draft row is
    /// share-locked so a concurrent completion cannot interleave.
    pub async fn upsert(
        pool: &PgPool,
        assessment_id: DbId,
        question_id: DbId,
        rating: Rating,
    ) -> Result<Option<Answer>, sqlx::Error> {
        let query = format!(
            "WITH draft AS ( \
                SELECT id FROM beep_assessments \
                WHERE id = $1 AND status = '{STATUS_DRAFT}' \
                FOR SHARE \
             ) \
             INSERT INTO beep_answers (assessment_id, question_id, value) \
             SELECT id, $2, $3 FROM draft \
             ON CONFLICT (assessment_id, question_id) \
             DO UPDATE SET value = EXCLUDED.value \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(assessment_id)
            .bind(question_id)
            .bind(rating.value())
            .fetch_optional(pool)
            .await
    }

    /// List all recorded answers of an assessment, ordered by question.
    pub async fn list_by_assessment(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Vec<Answer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beep_answers \
             WHERE assessment_id = $1 \
             ORDER BY question_id"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(assessment_id)
            .fetch_all(pool)
            .await
    }

    /// Load the answers to active questions as a question id -> rating map.
    pub async fn fetch_answer_set<'e, E>(
        executor: E,
        assessment_id: DbId,
    ) -> Result<AnswerSet, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows: Vec<(DbId, i16)> = sqlx::query_as(
            "SELECT a.question_id, a.value \
             FROM beep_answers a \
             JOIN beep_questions q ON q.id = a.question_id \
             WHERE a.assessment_id = $1 AND q.is_active",
        )
        .bind(assessment_id)
        .fetch_all(executor)
        .await?;

        rows.into_iter()
            .map(|(question_id, value)| {
                Rating::new(value)
                    .map(|rating| (question_id, rating))
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))
            })
            .collect()
    }

    /// Count answers to active questions.
    pub async fn count_answered<'e, E>(executor: E, assessment_id: DbId) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) \
             FROM beep_answers a \
             JOIN beep_questions q ON q.id = a.question_id \
             WHERE a.assessment_id = $1 AND q.is_active",
        )
        .bind(assessment_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Answers to active questions joined to their subcategory and category.
    pub async fn list_with_groups(
        pool: &PgPool,
        assessment_id: DbId,
    ) -> Result<Vec<AnswerWithGroup>, sqlx::Error> {
        sqlx::query_as::<_, AnswerWithGroup>(
            "SELECT a.question_id, q.subcategory_id, s.category_id, a.value \
             FROM beep_answers a \
             JOIN beep_questions q ON q.id = a.question_id \
             JOIN beep_subcategories s ON s.id = q.subcategory_id \
             WHERE a.assessment_id = $1 AND q.is_active \
             ORDER BY a.question_id",
        )
        .bind(assessment_id)
        .fetch_all(pool)
        .await
    }
}
