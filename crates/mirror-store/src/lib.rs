//! Persistence for the mirror responder: an append-only SQLite interaction
//! log and TOML category table files.

pub mod error;
pub mod paths;
pub mod schema;
pub mod store;
pub mod table_file;

pub use error::{Result, StoreError};
pub use paths::{config_path, default_data_dir, log_path};
pub use store::{InteractionLog, InteractionRecord};
pub use table_file::{load_table, parse_table, table_to_toml};
