//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches, where
//!   the entity is editable

pub mod answer;
pub mod assessment;
pub mod catalogue;
pub mod project;
pub mod task;
