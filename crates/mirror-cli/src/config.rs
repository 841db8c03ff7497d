//! Runtime settings: built-in defaults, then `mirror.toml`, then CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mirror_core::{CategoryTable, DEFAULT_SUBJECT, Responder};
use serde::Deserialize;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8528";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    /// Category table file; relative paths resolve against the config file.
    table: Option<PathBuf>,
    server: ServerSection,
    responder: ResponderSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerSection {
    addr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ResponderSection {
    subject: Option<String>,
    seed: Option<u64>,
}

/// Values supplied on the command line. `None` defers to the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub table: Option<PathBuf>,
    pub addr: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub addr: String,
    pub subject: String,
    pub seed: Option<u64>,
    pub table: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from the environment, the config file and `overrides`.
    ///
    /// `MIRROR_DATA_DIR` picks the data directory; `MIRROR_CONFIG` picks the
    /// config file, otherwise `<data_dir>/mirror.toml` is read when present.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let data_dir = std::env::var("MIRROR_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(mirror_store::default_data_dir);

        let explicit = std::env::var("MIRROR_CONFIG").ok().map(PathBuf::from);
        let config_path = explicit
            .clone()
            .unwrap_or_else(|| mirror_store::config_path(&data_dir));

        let file = if config_path.is_file() {
            read_config(&config_path)?
        } else if explicit.is_some() {
            anyhow::bail!("config file {} does not exist", config_path.display());
        } else {
            FileConfig::default()
        };

        Ok(Self::merge(data_dir, &config_path, file, overrides))
    }

    fn merge(data_dir: PathBuf, config_path: &Path, file: FileConfig, cli: Overrides) -> Self {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let file_table = file.table.map(|p| {
            if p.is_relative() {
                config_dir.join(p)
            } else {
                p
            }
        });

        Self {
            data_dir,
            addr: cli
                .addr
                .or(file.server.addr)
                .unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            subject: file
                .responder
                .subject
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            seed: cli.seed.or(file.responder.seed),
            table: cli.table.or(file_table),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        mirror_store::log_path(&self.data_dir)
    }

    /// Built-in table unless a table file is configured.
    pub fn load_table(&self) -> Result<CategoryTable> {
        match &self.table {
            Some(path) => mirror_store::load_table(path)
                .with_context(|| format!("failed to load category table {}", path.display())),
            None => Ok(CategoryTable::builtin()),
        }
    }

    pub fn build_responder(&self) -> Result<Responder> {
        Ok(Responder::new(self.load_table()?).with_subject(self.subject.clone()))
    }
}

fn read_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: FileConfig =
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> FileConfig {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::merge(
            PathBuf::from("/data"),
            Path::new("/data/mirror.toml"),
            FileConfig::default(),
            Overrides::default(),
        );
        assert_eq!(s.addr, DEFAULT_ADDR);
        assert_eq!(s.subject, DEFAULT_SUBJECT);
        assert!(s.seed.is_none());
        assert!(s.table.is_none());
        assert_eq!(s.log_path(), PathBuf::from("/data/interactions.db"));
    }

    #[test]
    fn test_file_values() {
        let file = parse(
            r#"
table = "tables/custom.toml"

[server]
addr = "0.0.0.0:9000"

[responder]
subject = "seeker"
seed = 11
"#,
        );
        let s = Settings::merge(
            PathBuf::from("/data"),
            Path::new("/etc/mirror/mirror.toml"),
            file,
            Overrides::default(),
        );
        assert_eq!(s.addr, "0.0.0.0:9000");
        assert_eq!(s.subject, "seeker");
        assert_eq!(s.seed, Some(11));
        assert_eq!(s.table, Some(PathBuf::from("/etc/mirror/tables/custom.toml")));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse(
            r#"
table = "/abs/table.toml"
[server]
addr = "0.0.0.0:9000"
[responder]
seed = 11
"#,
        );
        let s = Settings::merge(
            PathBuf::from("/data"),
            Path::new("/data/mirror.toml"),
            file,
            Overrides {
                table: Some(PathBuf::from("cli.toml")),
                addr: Some("127.0.0.1:1".to_string()),
                seed: Some(5),
            },
        );
        assert_eq!(s.addr, "127.0.0.1:1");
        assert_eq!(s.seed, Some(5));
        assert_eq!(s.table, Some(PathBuf::from("cli.toml")));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<FileConfig>("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn test_builtin_table_without_file() {
        let s = Settings::merge(
            PathBuf::from("/data"),
            Path::new("/data/mirror.toml"),
            FileConfig::default(),
            Overrides::default(),
        );
        let responder = s.build_responder().unwrap();
        assert_eq!(responder.table().len(), CategoryTable::builtin().len());
        assert_eq!(responder.subject(), DEFAULT_SUBJECT);
    }
}
