//! Category tables stored as TOML.
//!
//! ```toml
//! default = "presence"
//! phrases = ["Stillness is already here."]
//!
//! [[category]]
//! name = "fear_consciousness"
//! tone = "shadow"
//! keywords = ["afraid", "fear"]
//! template = "{name}, come back to this moment. {phrase}"
//! ```

use std::path::Path;

use mirror_core::{CategoryTable, TableSpec};

use crate::error::Result;

/// Parse and validate a table from TOML text.
pub fn parse_table(content: &str) -> Result<CategoryTable> {
    let spec: TableSpec = toml::from_str(content)?;
    Ok(CategoryTable::from_spec(spec)?)
}

pub fn load_table(path: &Path) -> Result<CategoryTable> {
    let content = std::fs::read_to_string(path)?;
    let table = parse_table(&content)?;
    tracing::info!(
        "loaded {} categories from {}",
        table.len(),
        path.display()
    );
    Ok(table)
}

pub fn table_to_toml(table: &CategoryTable) -> Result<String> {
    Ok(toml::to_string_pretty(&table.to_spec())?)
}
