//! Story repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist story post content next to the schema version it was saved at.
//! - Hand out only current-version documents, migrating stale rows on read.
//!
//! # Invariants
//! - Writes of typed documents always store `data_version = DATA_VERSION`.
//! - `get_story` never returns a stale document; a row that cannot be
//!   migrated is an error, not a pass-through.
//! - `migrate_stored_stories` rewrites all stale rows in one transaction.

use crate::db::DbError;
use crate::migration::{declared_version, migrate, pending_steps, MigrationError, DATA_VERSION};
use crate::model::story::{StoryDocument, StoryError};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a stored story.
pub type StoryId = Uuid;

const STORY_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    data_version,
    updated_at
FROM stories";

const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Story(StoryError),
    /// Stored content could not be brought to the current version.
    Migration { id: StoryId, source: MigrationError },
    /// Imported content declares a version this build cannot migrate.
    UnsupportedVersion(MigrationError),
    NotFound(StoryId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Story(err) => write!(f, "{err}"),
            Self::Migration { id, source } => write!(f, "story {id} cannot be migrated: {source}"),
            Self::UnsupportedVersion(source) => write!(f, "story cannot be imported: {source}"),
            Self::NotFound(id) => write!(f, "story not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored story: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Story(err) => Some(err),
            Self::Migration { source, .. } | Self::UnsupportedVersion(source) => Some(source),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<StoryError> for RepoError {
    fn from(value: StoryError) -> Self {
        Self::Story(value)
    }
}

/// A story as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRecord {
    pub id: StoryId,
    pub title: String,
    /// Always at `DATA_VERSION`.
    pub document: StoryDocument,
    /// Version the row was stored at before this read.
    pub stored_version: u32,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl StoryRecord {
    /// Whether the read had to migrate the stored content.
    pub fn was_migrated(&self) -> bool {
        self.stored_version != self.document.version
    }
}

/// Repository interface for story persistence.
pub trait StoryRepository {
    fn create_story(&self, title: &str, document: &StoryDocument) -> RepoResult<StoryId>;
    /// Stores post content as received, tagged with its version.
    ///
    /// Content without a `version` field is stamped with `version`; content
    /// declaring a different version is rejected.
    fn import_raw_story(&self, title: &str, content: &Value, version: u32)
        -> RepoResult<StoryId>;
    fn update_story(&self, id: StoryId, title: &str, document: &StoryDocument) -> RepoResult<()>;
    fn get_story(&self, id: StoryId) -> RepoResult<Option<StoryRecord>>;
    /// Most recently updated first.
    fn list_story_ids(&self) -> RepoResult<Vec<StoryId>>;
    fn delete_story(&self, id: StoryId) -> RepoResult<()>;
    fn stale_story_count(&self) -> RepoResult<u64>;
    /// Rewrites every stale row at the current version; returns rows rewritten.
    fn migrate_stored_stories(&self) -> RepoResult<usize>;
}

/// SQLite-backed story repository.
pub struct SqliteStoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StoryRepository for SqliteStoryRepository<'_> {
    fn create_story(&self, title: &str, document: &StoryDocument) -> RepoResult<StoryId> {
        let content = encode_document(document)?;
        self.insert_row(title, &content, DATA_VERSION)
    }

    fn import_raw_story(
        &self,
        title: &str,
        content: &Value,
        version: u32,
    ) -> RepoResult<StoryId> {
        pending_steps(version).map_err(RepoError::UnsupportedVersion)?;
        let Some(fields) = content.as_object() else {
            return Err(RepoError::InvalidData(
                "story content must be a JSON object".to_string(),
            ));
        };

        // The column drives migration on read, so content must agree with it.
        let mut fields = fields.clone();
        let unversioned = fields.get("version").map_or(true, Value::is_null);
        if unversioned {
            fields.insert("version".to_string(), Value::from(version));
        } else {
            let embedded = declared_version(content)
                .map_err(|err| RepoError::InvalidData(format!("story content version: {err}")))?;
            if embedded != version {
                return Err(RepoError::InvalidData(format!(
                    "story content declares version {embedded} but was imported as version {version}"
                )));
            }
        }
        self.insert_row(title, &Value::Object(fields).to_string(), version)
    }

    fn update_story(&self, id: StoryId, title: &str, document: &StoryDocument) -> RepoResult<()> {
        let content = encode_document(document)?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE stories
                 SET title = ?1, content = ?2, data_version = ?3, updated_at = {NOW_MS_SQL}
                 WHERE uuid = ?4;"
            ),
            params![title, content, DATA_VERSION, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_story(&self, id: StoryId) -> RepoResult<Option<StoryRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("{STORY_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                StoredRow::from_row,
            )
            .optional()?;

        row.map(StoredRow::into_record).transpose()
    }

    fn list_story_ids(&self) -> RepoResult<Vec<StoryId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid FROM stories ORDER BY updated_at DESC, uuid ASC;")?;
        let mut rows = stmt.query([])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            ids.push(parse_story_id(&text)?);
        }
        Ok(ids)
    }

    fn delete_story(&self, id: StoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM stories WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn stale_story_count(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM stories WHERE data_version <> ?1;",
            [DATA_VERSION],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative story count {count}")))
    }

    fn migrate_stored_stories(&self) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let stale = {
            let mut stmt = tx.prepare(&format!(
                "{STORY_SELECT_SQL} WHERE data_version <> ?1 ORDER BY uuid ASC;"
            ))?;
            let rows = stmt.query_map([DATA_VERSION], StoredRow::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        for row in &stale {
            let record = row.clone().into_record()?;
            let content = encode_document(&record.document)?;
            tx.execute(
                &format!(
                    "UPDATE stories
                     SET content = ?1, data_version = ?2, updated_at = {NOW_MS_SQL}
                     WHERE uuid = ?3;"
                ),
                params![content, DATA_VERSION, row.uuid],
            )?;
        }
        tx.commit()?;

        info!(
            "event=store_migrate_stories module=repo status=ok rewritten={} to={}",
            stale.len(),
            DATA_VERSION
        );
        Ok(stale.len())
    }
}

impl SqliteStoryRepository<'_> {
    fn insert_row(&self, title: &str, content: &str, version: u32) -> RepoResult<StoryId> {
        let id = Uuid::new_v4();
        self.conn.execute(
            &format!(
                "INSERT INTO stories (uuid, title, content, data_version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            params![id.to_string(), title, content, version],
        )?;
        Ok(id)
    }
}

/// Undecoded row, kept separate so decoding errors map to `RepoError`.
#[derive(Debug, Clone)]
struct StoredRow {
    uuid: String,
    title: String,
    content: String,
    data_version: u32,
    updated_at: i64,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            title: row.get("title")?,
            content: row.get("content")?,
            data_version: row.get("data_version")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_record(self) -> RepoResult<StoryRecord> {
        let id = parse_story_id(&self.uuid)?;
        let content: Value = serde_json::from_str(&self.content).map_err(|err| {
            RepoError::InvalidData(format!("stories.content for {id} is not JSON: {err}"))
        })?;

        let current = if self.data_version == DATA_VERSION {
            content
        } else {
            let migrated = migrate(&content, self.data_version).map_err(|source| {
                warn!(
                    "event=story_load module=repo status=error story_version={} error_code=migration_failed",
                    self.data_version
                );
                RepoError::Migration { id, source }
            })?;
            info!(
                "event=story_load module=repo status=ok migrated=true from={} to={}",
                self.data_version, DATA_VERSION
            );
            migrated
        };

        Ok(StoryRecord {
            id,
            title: self.title,
            document: StoryDocument::from_value(current)?,
            stored_version: self.data_version,
            updated_at: self.updated_at,
        })
    }
}

fn encode_document(document: &StoryDocument) -> RepoResult<String> {
    Ok(document.to_value()?.to_string())
}

fn parse_story_id(text: &str) -> RepoResult<StoryId> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in stories.uuid")))
}
