//! Story store table layout migrations.
//!
//! # Invariants
//! - `layout` values are strictly increasing.
//! - All pending layouts apply in one transaction, or none do.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct LayoutMigration {
    layout: u32,
    sql: &'static str,
}

const LAYOUT_MIGRATIONS: &[LayoutMigration] = &[
    LayoutMigration {
        layout: 1,
        sql: include_str!("0001_stories.sql"),
    },
    LayoutMigration {
        layout: 2,
        sql: include_str!("0002_story_version_index.sql"),
    },
];

/// Returns the newest table layout this build creates.
pub fn latest_layout() -> u32 {
    LAYOUT_MIGRATIONS.last().map_or(0, |migration| migration.layout)
}

/// Applies every layout migration newer than the connection's `user_version`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is ahead of this build.
/// - `Sqlite` when a statement fails; the transaction is rolled back.
pub fn apply_layout_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_layout();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            found,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = LAYOUT_MIGRATIONS
        .iter()
        .filter(|migration| migration.layout > found)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        // PRAGMA does not accept bound parameters.
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.layout))?;
    }
    tx.commit()?;

    info!(
        "event=store_layout_migrate module=db status=ok from={} to={} applied={}",
        found,
        latest,
        pending.len()
    );
    Ok(())
}
