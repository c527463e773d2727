//! Repository for the BEEP catalogue tables.

use sqlx::{PgExecutor, PgPool};
use starthub_core::types::DbId;

use crate::models::catalogue::{
    Category, CreateCategory, CreateQuestion, CreateSubcategory, Question, Subcategory,
};

const CATEGORY_COLUMNS: &str = "id, name, description, sort_order, created_at, updated_at";
const SUBCATEGORY_COLUMNS: &str = "id, category_id, name, sort_order, created_at, updated_at";
const QUESTION_COLUMNS: &str =
    "id, subcategory_id, text, weight, sort_order, is_active, created_at, updated_at";

/// Read access to the question catalogue, plus inserts for seeding.
pub struct CatalogueRepo;

impl CatalogueRepo {
    /// Number of active questions in the catalogue.
    pub async fn count_active_questions<'e, E>(executor: E) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM beep_questions WHERE is_active")
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    /// List all categories in display order.
    pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} FROM beep_categories ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    /// List all subcategories in display order.
    pub async fn list_subcategories(pool: &PgPool) -> Result<Vec<Subcategory>, sqlx::Error> {
        let query = format!(
            "SELECT {SUBCATEGORY_COLUMNS} FROM beep_subcategories \
             ORDER BY category_id, sort_order, id"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .fetch_all(pool)
            .await
    }

    /// List active questions in display order.
    pub async fn list_active_questions(pool: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {QUESTION_COLUMNS} FROM beep_questions WHERE is_active \
             ORDER BY subcategory_id, sort_order, id"
        );
        sqlx::query_as::<_, Question>(&query).fetch_all(pool).await
    }

    /// Find a question by ID (active or not).
    pub async fn find_question(pool: &PgPool, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {QUESTION_COLUMNS} FROM beep_questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a category.
    pub async fn create_category(
        pool: &PgPool,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO beep_categories (name, description, sort_order) \
             VALUES ($1, $2, COALESCE($3, 0)) \
             RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Insert a subcategory.
    pub async fn create_subcategory(
        pool: &PgPool,
        input: &CreateSubcategory,
    ) -> Result<Subcategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO beep_subcategories (category_id, name, sort_order) \
             VALUES ($1, $2, COALESCE($3, 0)) \
             RETURNING {SUBCATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Subcategory>(&query)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Insert a question.
    pub async fn create_question(
        pool: &PgPool,
        input: &CreateQuestion,
    ) -> Result<Question, sqlx::Error> {
        let query = format!(
            "INSERT INTO beep_questions (subcategory_id, text, weight, sort_order, is_active) \
             VALUES ($1, $2, COALESCE($3, 1.0), COALESCE($4, 0), COALESCE($5, TRUE)) \
             RETURNING {QUESTION_COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(input.subcategory_id)
            .bind(&input.text)
            .bind(input.weight)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }
}
