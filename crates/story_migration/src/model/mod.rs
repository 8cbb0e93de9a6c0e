//! Typed views over migrated story documents.
//!
//! # Responsibility
//! - Define the current-version story, page, element and resource shapes.
//! - Normalize WordPress media payloads into resources.
//!
//! # Invariants
//! - Typed documents only exist at the current schema version.

pub mod resource;
pub mod story;
