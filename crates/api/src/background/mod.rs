//! Background work that outlives a single request.
//!
//! - [`autosave`] -- debounced, cancellable answer writes.

pub mod autosave;
