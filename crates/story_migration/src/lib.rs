//! Versioned story document migration.
//!
//! Upgrades serialized story documents to the current schema version and
//! provides the consumers that rely on that guarantee: a typed story model,
//! media resource normalization, the bundled template loader and a SQLite
//! story store.

pub mod db;
pub mod logging;
pub mod migration;
pub mod model;
pub mod repo;
pub mod template;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use migration::{
    declared_version, latest_version, migrate, migrate_document, needs_migration, pending_steps,
    MigrationError, MigrationResult, StepError, StepInfo, DATA_VERSION, MIN_SUPPORTED_VERSION,
};
pub use model::resource::{Attachment, MediaPickerItem, Resource, ResourceError, ResourceType};
pub use model::story::{Element, ElementType, Page, StoryDocument, StoryError, StoryResult};
pub use repo::story_repo::{
    RepoError, RepoResult, SqliteStoryRepository, StoryId, StoryRecord, StoryRepository,
};
pub use template::{
    load_template, load_templates, prepare_template, Template, TemplateConfig, TemplateError,
    TemplateMetadata, TemplateResult,
};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, latest_version, DATA_VERSION};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn latest_registered_step_matches_data_version() {
        assert_eq!(latest_version(), DATA_VERSION);
    }
}
