//! Domain logic for the Startup HUB backend.
//!
//! Everything in this crate is pure: no database, no HTTP, no clocks. The
//! `db` and `api` crates load data, call into these functions, and persist
//! the results.

pub mod beep;
pub mod error;
pub mod project_status;
pub mod types;
