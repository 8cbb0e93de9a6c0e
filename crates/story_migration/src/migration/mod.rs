//! Story document schema migrations.
//!
//! # Responsibility
//! - Register document migration steps in strictly increasing version order.
//! - Upgrade a serialized story document from any supported version to
//!   [`DATA_VERSION`] without touching the caller's copy.
//!
//! # Invariants
//! - Each step runs exactly once, in ascending order, and no step is skipped.
//! - A document whose version cannot be resolved is rejected, never passed
//!   through unmigrated.
//! - A failing step aborts the whole migration; no partial output escapes.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod registry;
mod steps;
mod walk;

pub use registry::{
    declared_version, latest_version, migrate, migrate_document, needs_migration, pending_steps,
    StepInfo, DATA_VERSION, MIN_SUPPORTED_VERSION,
};

pub type MigrationResult<T> = Result<T, MigrationError>;

/// Failure raised while resolving a document version or running a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// Document has no `version` field.
    MissingVersion,
    /// `version` is present but is not a non-negative integer.
    InvalidVersion(String),
    /// Version is outside the supported range.
    UnknownVersion {
        version: u32,
        min_supported: u32,
        latest_supported: u32,
    },
    /// Document root is not a JSON object.
    NotAnObject,
    /// A migration step rejected the document.
    Step {
        version: u32,
        step: &'static str,
        source: StepError,
    },
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVersion => write!(f, "story document has no `version` field"),
            Self::InvalidVersion(raw) => {
                write!(f, "story document version `{raw}` is not a valid schema version")
            }
            Self::UnknownVersion {
                version,
                min_supported,
                latest_supported,
            } => write!(
                f,
                "story document version {version} is not supported (expected {min_supported}..={latest_supported})"
            ),
            Self::NotAnObject => write!(f, "story document must be a JSON object"),
            Self::Step {
                version,
                step,
                source,
            } => write!(f, "migration to version {version} ({step}) failed: {source}"),
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure inside a single migration step, located by JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// Value at `path` does not have the shape the step expects.
    Malformed { path: String, reason: String },
    /// Color string at `path` is not a hex color.
    InvalidColor { path: String, value: String },
    /// Reference at `path` points to an element that does not exist.
    DanglingReference { path: String, id: String },
}

impl StepError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl Display for StepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { path, reason } => write!(f, "malformed value at `{path}`: {reason}"),
            Self::InvalidColor { path, value } => {
                write!(f, "invalid color `{value}` at `{path}`")
            }
            Self::DanglingReference { path, id } => {
                write!(f, "`{path}` references missing element `{id}`")
            }
        }
    }
}

impl Error for StepError {}
