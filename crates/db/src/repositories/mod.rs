//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Queries used inside the
//! assessment completion transaction accept any [`sqlx::PgExecutor`] so
//! they can run on either the pool or a transaction.

pub mod answer_repo;
pub mod assessment_repo;
pub mod catalogue_repo;
pub mod project_repo;
pub mod task_repo;

pub use answer_repo::AnswerRepo;
pub use assessment_repo::AssessmentRepo;
pub use catalogue_repo::CatalogueRepo;
pub use project_repo::ProjectRepo;
pub use task_repo::TaskRepo;
