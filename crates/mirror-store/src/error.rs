use std::fmt;

use mirror_core::TableError;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    TomlDe(toml::de::Error),
    TomlSer(toml::ser::Error),
    Json(serde_json::Error),
    Table(TableError),
    InvalidData(String),
    /// The log was written by a newer version of this tool.
    UnsupportedSchema { found: i64, supported: i64 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "SQLite error: {e}"),
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::TomlDe(e) => write!(f, "invalid TOML: {e}"),
            StoreError::TomlSer(e) => write!(f, "TOML encoding failed: {e}"),
            StoreError::Json(e) => write!(f, "JSON error: {e}"),
            StoreError::Table(e) => write!(f, "invalid category table: {e}"),
            StoreError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            StoreError::UnsupportedSchema { found, supported } => write!(
                f,
                "interaction log schema version {found} is newer than supported version {supported}"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlite(e) => Some(e),
            StoreError::Io(e) => Some(e),
            StoreError::TomlDe(e) => Some(e),
            StoreError::TomlSer(e) => Some(e),
            StoreError::Json(e) => Some(e),
            StoreError::Table(e) => Some(e),
            StoreError::InvalidData(_) | StoreError::UnsupportedSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(e: toml::de::Error) -> Self {
        StoreError::TomlDe(e)
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(e: toml::ser::Error) -> Self {
        StoreError::TomlSer(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl From<TableError> for StoreError {
    fn from(e: TableError) -> Self {
        StoreError::Table(e)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
