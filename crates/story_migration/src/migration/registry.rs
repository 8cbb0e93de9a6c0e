//! Migration step registry and executor.
//!
//! # Invariants
//! - `version` values in [`MIGRATIONS`] are contiguous, starting at
//!   `MIN_SUPPORTED_VERSION + 1`.
//! - The last registered version is [`DATA_VERSION`].

use super::steps;
use super::walk::StepResult;
use super::{MigrationError, MigrationResult};
use log::{debug, info, warn};
use serde_json::Value;
use std::time::Instant;

/// Schema version produced by this build.
pub const DATA_VERSION: u32 = 10;

/// Oldest schema version that can still be migrated.
pub const MIN_SUPPORTED_VERSION: u32 = 1;

#[derive(Clone, Copy)]
struct Migration {
    /// Version the step produces.
    version: u32,
    name: &'static str,
    apply: fn(Value) -> StepResult<Value>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        name: "data_pixels",
        apply: steps::v0002_data_pixels::migrate,
    },
    Migration {
        version: 3,
        name: "font_objects",
        apply: steps::v0003_font_objects::migrate,
    },
    Migration {
        version: 4,
        name: "rotation_angle",
        apply: steps::v0004_rotation_angle::migrate,
    },
    Migration {
        version: 5,
        name: "color_patterns",
        apply: steps::v0005_color_patterns::migrate,
    },
    Migration {
        version: 6,
        name: "fullbleed_background",
        apply: steps::v0006_fullbleed_background::migrate,
    },
    Migration {
        version: 7,
        name: "padding_object",
        apply: steps::v0007_padding_object::migrate,
    },
    Migration {
        version: 8,
        name: "media_resource",
        apply: steps::v0008_media_resource::migrate,
    },
    Migration {
        version: 9,
        name: "background_element",
        apply: steps::v0009_background_element::migrate,
    },
    Migration {
        version: 10,
        name: "inline_text_styles",
        apply: steps::v0010_inline_text_styles::migrate,
    },
];

/// Public description of one registered step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    /// Version the step produces.
    pub version: u32,
    pub name: &'static str,
}

/// Returns the latest document version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS
        .last()
        .map_or(MIN_SUPPORTED_VERSION, |migration| migration.version)
}

/// Returns whether a document at `version` is older than [`DATA_VERSION`].
///
/// Unsupported versions return `false`; use [`pending_steps`] to validate.
pub fn needs_migration(version: u32) -> bool {
    (MIN_SUPPORTED_VERSION..latest_version()).contains(&version)
}

/// Lists the steps [`migrate`] would run for a document at `version`.
///
/// # Errors
/// - `UnknownVersion` when `version` is outside the supported range.
pub fn pending_steps(version: u32) -> MigrationResult<Vec<StepInfo>> {
    ensure_supported(version)?;
    Ok(MIGRATIONS
        .iter()
        .filter(|migration| migration.version > version)
        .map(|migration| StepInfo {
            version: migration.version,
            name: migration.name,
        })
        .collect())
}

/// Migrates `document`, declared at `version`, to [`DATA_VERSION`].
///
/// The input is never modified; the result is a new document whose `version`
/// field equals [`DATA_VERSION`]. Migrating a current document only rewrites
/// its `version` field.
///
/// # Errors
/// - `UnknownVersion` when `version` is outside the supported range.
/// - `NotAnObject` when the document root is not a JSON object.
/// - `Step` when any step rejects the document. No partial result is returned.
pub fn migrate(document: &Value, version: u32) -> MigrationResult<Value> {
    let started_at = Instant::now();
    if let Err(err) = ensure_supported(version) {
        warn!(
            "event=migrate module=migration status=error from={} error_code=unknown_version",
            version
        );
        return Err(err);
    }
    if !document.is_object() {
        warn!(
            "event=migrate module=migration status=error from={} error_code=not_an_object",
            version
        );
        return Err(MigrationError::NotAnObject);
    }

    let mut current = document.clone();
    let mut applied = 0_usize;
    for migration in MIGRATIONS {
        if migration.version <= version {
            continue;
        }

        current = match (migration.apply)(current) {
            Ok(next) => next,
            Err(source) => {
                warn!(
                    "event=migrate module=migration status=error from={} step={} to={} error_code=step_failed error={}",
                    version, migration.name, migration.version, source
                );
                return Err(MigrationError::Step {
                    version: migration.version,
                    step: migration.name,
                    source,
                });
            }
        };
        applied += 1;
        debug!(
            "event=migrate_step module=migration status=ok step={} to={}",
            migration.name, migration.version
        );
    }

    if let Some(root) = current.as_object_mut() {
        root.insert("version".to_string(), Value::from(DATA_VERSION));
    }

    if applied > 0 {
        info!(
            "event=migrate module=migration status=ok from={} to={} steps={} duration_ms={}",
            version,
            DATA_VERSION,
            applied,
            started_at.elapsed().as_millis()
        );
    }
    Ok(current)
}

/// Migrates `document` using its own `version` field.
///
/// # Errors
/// - `MissingVersion` when the document has no `version` field.
/// - `InvalidVersion` when `version` is not a non-negative integer.
/// - Any error returned by [`migrate`].
pub fn migrate_document(document: &Value) -> MigrationResult<Value> {
    let version = declared_version(document)?;
    migrate(document, version)
}

/// Reads the schema version a document declares for itself.
///
/// # Errors
/// - `NotAnObject` when the root is not a JSON object.
/// - `MissingVersion` when `version` is absent or null.
/// - `InvalidVersion` when `version` is not a non-negative integer.
pub fn declared_version(document: &Value) -> MigrationResult<u32> {
    let root = document.as_object().ok_or(MigrationError::NotAnObject)?;
    let raw = root.get("version").ok_or(MigrationError::MissingVersion)?;
    if raw.is_null() {
        return Err(MigrationError::MissingVersion);
    }
    raw.as_u64()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| MigrationError::InvalidVersion(raw.to_string()))
}

fn ensure_supported(version: u32) -> MigrationResult<()> {
    let latest = latest_version();
    if version < MIN_SUPPORTED_VERSION || version > latest {
        return Err(MigrationError::UnknownVersion {
            version,
            min_supported: MIN_SUPPORTED_VERSION,
            latest_supported: latest,
        });
    }
    Ok(())
}
