//! Bundled story template loading.
//!
//! # Responsibility
//! - Read template documents from a directory of JSON files.
//! - Point placeholder asset URLs at the configured CDN base URL.
//! - Migrate every template to the current schema before handing it out.
//!
//! # Invariants
//! - Returned templates always carry the current schema version.
//! - Template order follows the configured name order.

use crate::migration::MigrationError;
use crate::model::story::StoryError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod config;
mod loader;

pub use config::TemplateConfig;
pub use loader::{
    load_template, load_templates, prepare_template, Template, TemplateColor, TemplateMetadata,
    TEMPLATE_BASE_URL_PLACEHOLDER,
};

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug)]
pub enum TemplateError {
    /// Configuration is unusable.
    InvalidConfig(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        name: String,
        source: serde_json::Error,
    },
    Migration {
        name: String,
        source: MigrationError,
    },
    Story {
        name: String,
        source: StoryError,
    },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid template config: {message}"),
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Parse { name, source } => write!(f, "template `{name}` is not valid JSON: {source}"),
            Self::Migration { name, source } => {
                write!(f, "template `{name}` could not be migrated: {source}")
            }
            Self::Story { name, source } => write!(f, "template `{name}` is invalid: {source}"),
        }
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Migration { source, .. } => Some(source),
            Self::Story { source, .. } => Some(source),
        }
    }
}
