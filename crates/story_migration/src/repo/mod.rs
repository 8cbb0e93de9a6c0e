//! Story persistence.
//!
//! # Responsibility
//! - Store story post content together with the schema version it was
//!   written at.
//! - Keep SQL details behind the `StoryRepository` contract.
//!
//! # Invariants
//! - Reads return current-version documents only.

pub mod story_repo;
