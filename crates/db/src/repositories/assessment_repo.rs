//! Repository for the `beep_assessments` table.

use sqlx::{PgExecutor, PgPool};
use starthub_core::beep::{BeepResult, STATUS_COMPLETED, STATUS_DRAFT};
use starthub_core::types::{DbId, Timestamp};

use crate::models::assessment::Assessment;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, company_id, status, final_score, maturity_level, \
                       completed_at, created_at, updated_at";

/// Provides lifecycle operations for BEEP assessments.
pub struct AssessmentRepo;

impl AssessmentRepo {
    /// Start a new draft assessment for `user_id`.
    pub async fn create_draft(
        pool: &PgPool,
        user_id: DbId,
        company_id: Option<DbId>,
    ) -> Result<Assessment, sqlx::Error> {
        let query = format!(
            "INSERT INTO beep_assessments (user_id, company_id, status) \
             VALUES ($1, $2, '{STATUS_DRAFT}') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(user_id)
            .bind(company_id)
            .fetch_one(pool)
            .await
    }

    /// Find an assessment by ID regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM beep_assessments WHERE id = $1");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an assessment by ID, only if it belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM beep_assessments WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lock an owned assessment row for the rest of the transaction.
    ///
    /// Concurrent answer writes take a share lock on the same row, so they
    /// wait until the locking transaction ends.
    pub async fn lock_for_user<'e, E>(
        executor: E,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assessment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM beep_assessments \
             WHERE id = $1 AND user_id = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// List a user's assessments, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beep_assessments \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find the newest draft for a (user, company) pair. A `None` company
    /// matches drafts without a company.
    pub async fn find_active_draft(
        pool: &PgPool,
        user_id: DbId,
        company_id: Option<DbId>,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beep_assessments \
             WHERE user_id = $1 \
               AND company_id IS NOT DISTINCT FROM $2 \
               AND status = '{STATUS_DRAFT}' \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(user_id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an owned draft and its answers. Returns `true` if a row was removed.
    ///
    /// Completed assessments are never deleted here.
    pub async fn delete_draft(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM beep_assessments \
             WHERE id = $1 AND user_id = $2 AND status = '{STATUS_DRAFT}'"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the score, maturity level and completion time and move the
    /// assessment from `draft` to `completed` in a single update.
    ///
    /// Returns `None` if the assessment does not exist or is no longer a draft.
    pub async fn complete<'e, E>(
        executor: E,
        id: DbId,
        result: &BeepResult,
        completed_at: Timestamp,
    ) -> Result<Option<Assessment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE beep_assessments SET \
                status = '{STATUS_COMPLETED}', \
                final_score = $2, \
                maturity_level = $3, \
                completed_at = $4 \
             WHERE id = $1 AND status = '{STATUS_DRAFT}' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(result.final_score)
            .bind(result.maturity_level.as_str())
            .bind(completed_at)
            .fetch_optional(executor)
            .await
    }
}
