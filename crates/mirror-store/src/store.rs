use std::path::{Path, PathBuf};

use mirror_core::{Response, Tone};
use rusqlite::{Connection, Row, params};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::schema;

/// One logged reply, as read back from the database.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InteractionRecord {
    pub seq: i64,
    pub id: Uuid,
    pub query: String,
    pub subject: String,
    pub category: String,
    pub tone: Tone,
    pub score: f64,
    pub message: String,
    pub phrase: Option<String>,
    pub created_at: String,
}

/// Append-only SQLite log of responses.
pub struct InteractionLog {
    conn: Connection,
    path: Option<PathBuf>,
}

const SELECT_COLUMNS: &str =
    "SELECT seq, id, query, subject, category, tone, score, message, phrase, created_at FROM interactions";

impl InteractionLog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::info!("opened interaction log at {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Database file, or `None` for an in-memory log.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // --- Writes ---

    /// Append one reply to the log and return its sequence number.
    pub fn append(&self, query: &str, response: &Response) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO interactions (id, query, subject, category, tone, score, message, phrase, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                response.id.to_string(),
                query,
                response.subject,
                response.category,
                response.tone.as_str(),
                response.score,
                response.message,
                response.phrase,
                response.timestamp,
            ],
        )?;
        let seq = self.conn.last_insert_rowid();
        tracing::debug!(seq, category = %response.category, "logged interaction");
        Ok(seq)
    }

    // --- Reads ---

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Up to `limit` most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY seq DESC LIMIT ?1"))?;
        let rows = stmt
            .query_map([limit as i64], read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_record).collect()
    }

    /// Every record, oldest first.
    pub fn all(&self) -> Result<Vec<InteractionRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY seq ASC"))?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_record).collect()
    }

    /// Logged replies per category, most frequent first (ties by name).
    pub fn category_counts(&self) -> Result<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS n FROM interactions
             GROUP BY category ORDER BY n DESC, category ASC",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(counts)
    }

    // --- Export ---

    /// Write every record to `path` as a pretty JSON array. Returns the count.
    pub fn export_json_file(&self, path: &Path) -> Result<usize> {
        let records = self.all()?;
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;
        tracing::info!("exported {} interactions to {}", records.len(), path.display());
        Ok(records.len())
    }
}

type RawRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    f64,
    String,
    Option<String>,
    String,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn into_record(raw: RawRow) -> Result<InteractionRecord> {
    let (seq, id, query, subject, category, tone, score, message, phrase, created_at) = raw;
    Ok(InteractionRecord {
        seq,
        id: parse_uuid(&id)?,
        query,
        subject,
        category,
        tone: parse_tone(&tone)?,
        score,
        message,
        phrase,
        created_at,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::InvalidData(format!("invalid UUID '{s}': {e}")))
}

fn parse_tone(s: &str) -> Result<Tone> {
    match s {
        "shadow" => Ok(Tone::Shadow),
        "light" => Ok(Tone::Light),
        other => Err(StoreError::InvalidData(format!("invalid tone '{other}'"))),
    }
}
