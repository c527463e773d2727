//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation. Tokens are issued
//!   by the platform's auth service with a shared secret; this crate only
//!   mints them for tooling and tests.

pub mod jwt;
