//! # shadowdb-write
//!
//! Validates and sanitizes input, then drives the insert-then-embed,
//! soft-delete, undelete, and retention-purge state machine described in
//! DESIGN.md.

pub mod lifecycle;
pub mod sanitize;

pub use lifecycle::{MemoryPatchInput, NewMemoryInput, WriteLifecycle, WriteOpError};
