//! SQLite bootstrap for the story store.
//!
//! # Responsibility
//! - Open story store connections with the pragmas the repository relies on.
//! - Bring the table layout up to date before any story row is touched.
//!
//! # Invariants
//! - Table layout version lives in `PRAGMA user_version` and is independent
//!   of the story document `DATA_VERSION`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Store layout is newer than this build understands.
    UnsupportedSchemaVersion { found: u32, latest_supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "story store layout {found} is newer than supported layout {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
