use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rusqlite::config::DbConfig;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::StorageOptions;

mod error;
mod schema;

pub use error::{StorageError, StorageResult};

pub const UNTITLED_NOTE: &str = "Untitled Note";

const FOLDER_COLUMNS: &str = "id, name, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, folder_id, title, content, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: i64,
    pub folder_id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl NoteRecord {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED_NOTE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub folder_id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Partial note update. An outer `None` leaves the column untouched and
/// `Some(None)` stores NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub folder_id: Option<i64>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(Some(title.into())),
            ..Self::default()
        }
    }

    /// Sets both editable fields.
    pub fn fields(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(Some(title.into())),
            content: Some(Some(content.into())),
            folder_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.folder_id.is_none()
    }
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> anyhow::Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn list_folders(&self) -> StorageResult<Vec<FolderRecord>> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders ORDER BY created_at ASC, id ASC");
            let mut stmt = conn.prepare(&sql).context("preparing folder listing")?;
            let folders = stmt
                .query_map([], folder_from_row)
                .context("querying folders")?
                .collect::<Result<Vec<_>, _>>()
                .context("reading folder rows")?;
            Ok(folders)
        })
    }

    pub fn fetch_folder(&self, folder_id: i64) -> StorageResult<FolderRecord> {
        self.with_connection(|conn| {
            select_folder(conn, folder_id)?.ok_or_else(|| StorageError::folder_not_found(folder_id))
        })
    }

    pub fn create_folder(&self, name: &str) -> StorageResult<FolderRecord> {
        let name = validate_folder_name(name)?;
        self.with_connection(|conn| {
            let now = now_millis();
            conn.execute(
                "INSERT INTO folders (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![name, now],
            )
            .context("inserting folder")?;
            let id = conn.last_insert_rowid();
            select_folder(conn, id)?.ok_or_else(|| {
                StorageError::Backend(anyhow::anyhow!("folder {id} missing after insert"))
            })
        })
    }

    pub fn rename_folder(&self, folder_id: i64, name: &str) -> StorageResult<FolderRecord> {
        let name = validate_folder_name(name)?;
        self.with_connection(|conn| {
            let updated = conn
                .execute(
                    "UPDATE folders SET name = ?1, updated_at = ?2 WHERE id = ?3",
                    params![name, now_millis(), folder_id],
                )
                .context("renaming folder")?;
            if updated == 0 {
                return Err(StorageError::folder_not_found(folder_id));
            }
            select_folder(conn, folder_id)?.ok_or_else(|| StorageError::folder_not_found(folder_id))
        })
    }

    /// Deletes the folder; its notes go with it through the foreign key cascade.
    pub fn delete_folder(&self, folder_id: i64) -> StorageResult<()> {
        self.with_connection(|conn| {
            let deleted = conn
                .execute("DELETE FROM folders WHERE id = ?1", [folder_id])
                .context("deleting folder")?;
            if deleted == 0 {
                return Err(StorageError::folder_not_found(folder_id));
            }
            Ok(())
        })
    }

    /// Notes of one folder, newest first.
    pub fn list_notes(&self, folder_id: i64) -> StorageResult<Vec<NoteRecord>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE folder_id = ?1
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql).context("preparing note listing")?;
            let notes = stmt
                .query_map([folder_id], note_from_row)
                .context("querying notes")?
                .collect::<Result<Vec<_>, _>>()
                .context("reading note rows")?;
            Ok(notes)
        })
    }

    pub fn fetch_note(&self, note_id: i64) -> StorageResult<NoteRecord> {
        self.with_connection(|conn| {
            select_note(conn, note_id)?.ok_or_else(|| StorageError::note_not_found(note_id))
        })
    }

    pub fn create_note(&self, note: &NewNote) -> StorageResult<NoteRecord> {
        let title = note.title.as_deref().filter(|t| !t.is_empty());
        let content = note.content.as_deref().filter(|c| !c.is_empty());
        self.with_connection(|conn| {
            ensure_folder_exists(conn, note.folder_id)?;
            let now = now_millis();
            conn.execute(
                "INSERT INTO notes (folder_id, title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![note.folder_id, title, content, now],
            )
            .context("inserting note")?;
            let id = conn.last_insert_rowid();
            select_note(conn, id)?.ok_or_else(|| {
                StorageError::Backend(anyhow::anyhow!("note {id} missing after insert"))
            })
        })
    }

    pub fn update_note(&self, note_id: i64, patch: &NotePatch) -> StorageResult<NoteRecord> {
        if patch.is_empty() {
            return Err(StorageError::validation("no fields to update provided"));
        }
        self.with_connection(|conn| {
            if select_note(conn, note_id)?.is_none() {
                return Err(StorageError::note_not_found(note_id));
            }
            if let Some(folder_id) = patch.folder_id {
                ensure_folder_exists(conn, folder_id)?;
            }
            let mut assignments = vec!["updated_at = ?1"];
            let mut values = vec![Value::from(now_millis())];
            if let Some(title) = &patch.title {
                assignments.push("title = ?");
                values.push(Value::from(title.clone()));
            }
            if let Some(content) = &patch.content {
                assignments.push("content = ?");
                values.push(Value::from(content.clone()));
            }
            if let Some(folder_id) = patch.folder_id {
                assignments.push("folder_id = ?");
                values.push(Value::from(folder_id));
            }
            let sql = format!(
                "UPDATE notes SET {} WHERE id = ?",
                assignments.join(", ")
            );
            values.push(Value::from(note_id));
            conn.execute(&sql, params_from_iter(values.iter()))
                .context("updating note")?;
            select_note(conn, note_id)?.ok_or_else(|| StorageError::note_not_found(note_id))
        })
    }

    pub fn delete_note(&self, note_id: i64) -> StorageResult<()> {
        self.with_connection(|conn| {
            let deleted = conn
                .execute("DELETE FROM notes WHERE id = ?1", [note_id])
                .context("deleting note")?;
            if deleted == 0 {
                return Err(StorageError::note_not_found(note_id));
            }
            Ok(())
        })
    }
}

fn validate_folder_name(name: &str) -> StorageResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StorageError::validation("folder name is required"));
    }
    Ok(trimmed)
}

fn ensure_folder_exists(conn: &Connection, folder_id: i64) -> StorageResult<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM folders WHERE id = ?1", [folder_id], |row| {
            row.get(0)
        })
        .optional()
        .context("checking folder existence")?;
    if exists.is_none() {
        return Err(StorageError::validation(format!(
            "folder {folder_id} does not exist"
        )));
    }
    Ok(())
}

fn select_folder(conn: &Connection, folder_id: i64) -> StorageResult<Option<FolderRecord>> {
    let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?1");
    let folder = conn
        .query_row(&sql, [folder_id], folder_from_row)
        .optional()
        .context("fetching folder")?;
    Ok(folder)
}

fn select_note(conn: &Connection, note_id: i64) -> StorageResult<Option<NoteRecord>> {
    let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1");
    let note = conn
        .query_row(&sql, [note_id], note_from_row)
        .optional()
        .context("fetching note")?;
    Ok(note)
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<FolderRecord> {
    Ok(FolderRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: timestamp_column(row, 2)?,
        updated_at: timestamp_column(row, 3)?,
    })
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<NoteRecord> {
    Ok(NoteRecord {
        id: row.get(0)?,
        folder_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let millis: i64 = row.get(idx)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn init(options: &StorageOptions) -> anyhow::Result<StorageHandle> {
    let db_path = &options.database_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, options)?;
    schema::apply(&conn)?;
    if !existed && options.seed_on_first_run {
        seed_initial_notes(&conn)?;
    }
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(options.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> anyhow::Result<()> {
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)
        .context("enabling foreign keys")?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

fn seed_initial_notes(conn: &Connection) -> anyhow::Result<()> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM folders LIMIT 1", [], |row| row.get(0))
        .optional()
        .context("checking for existing folders")?;
    if existing.is_some() {
        return Ok(());
    }

    tracing::info!("seeding first-run folder");
    let now = now_millis();
    conn.execute(
        "INSERT INTO folders (name, created_at, updated_at) VALUES ('Inbox', ?1, ?1)",
        [now],
    )
    .context("inserting seed folder")?;
    let folder_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO notes (folder_id, title, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![
            folder_id,
            "Welcome",
            "# Welcome\n\nNotes live in folders. Edits are saved a moment after you stop typing.\n",
            now
        ],
    )
    .context("inserting seed note")?;
    Ok(())
}
