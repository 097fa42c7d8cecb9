use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::{cli::Cli, references::DEFAULT_ABSTRACT_TYPES};

/// Runtime configuration resolved from CLI, environment, config file and
/// defaults, in that order of precedence.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory whose files are subject to cleanup.
    pub storage_root: PathBuf,
    /// SQLite database holding the records.
    pub database: PathBuf,
    /// Record types to scan; every table when unset.
    pub record_types: Option<Vec<String>>,
    /// Record type names that are never loaded.
    pub abstract_types: Vec<String>,
    /// Prefixes removed from references before lookup.
    pub strip_prefixes: Vec<String>,
    pub dry_run: bool,
    pub logging_enabled: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    storage: FileStorage,
    #[serde(default)]
    records: FileRecords,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Deserialize, Default)]
struct FileStorage {
    root: Option<PathBuf>,
    #[serde(default)]
    strip_prefixes: Vec<String>,
}

#[derive(Deserialize)]
struct FileRecords {
    database: Option<PathBuf>,
    types: Option<Vec<String>>,
    #[serde(default = "default_abstract_types")]
    abstract_types: Vec<String>,
}

#[derive(Deserialize)]
struct FileLogging {
    #[serde(default = "default_logging")]
    enabled: bool,
}

fn default_abstract_types() -> Vec<String> {
    DEFAULT_ABSTRACT_TYPES.iter().map(|s| s.to_string()).collect()
}

fn default_logging() -> bool {
    true
}

impl Default for FileRecords {
    fn default() -> Self {
        Self {
            database: None,
            types: None,
            abstract_types: default_abstract_types(),
        }
    }
}

impl Default for FileLogging {
    fn default() -> Self {
        Self {
            enabled: default_logging(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_cfg = match config_path(cli) {
            ConfigPath::Explicit(path) => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                parse(&text)?
            }
            ConfigPath::Fallback(path) => match fs::read_to_string(&path) {
                Ok(text) => parse(&text)?,
                Err(_) => FileConfig::default(),
            },
        };

        let mut storage_root = file_cfg.storage.root;
        let mut database = file_cfg.records.database;
        let mut logging = file_cfg.logging.enabled;

        // environment overrides
        if let Ok(root) = std::env::var("FILEREAPER_STORAGE_ROOT") {
            storage_root = Some(PathBuf::from(root));
        }
        if let Ok(db) = std::env::var("FILEREAPER_DATABASE") {
            database = Some(PathBuf::from(db));
        }
        if let Ok(l) = std::env::var("FILEREAPER_LOGGING") {
            if let Ok(l) = l.parse::<bool>() {
                logging = l;
            }
        }

        // CLI overrides
        if let Some(root) = &cli.storage_root {
            storage_root = Some(root.clone());
        }
        if let Some(db) = &cli.database {
            database = Some(db.clone());
        }
        if let Some(l) = cli.logging {
            logging = l;
        }

        let storage_root = storage_root.context("no storage root configured")?;
        let database = database.context("no database configured")?;

        Ok(Self {
            storage_root,
            database,
            record_types: file_cfg.records.types,
            abstract_types: file_cfg.records.abstract_types,
            strip_prefixes: file_cfg.storage.strip_prefixes,
            dry_run: cli.dry_run,
            logging_enabled: logging,
        })
    }
}

enum ConfigPath {
    /// Given on the command line or in the environment; must be readable.
    Explicit(PathBuf),
    Fallback(PathBuf),
}

fn config_path(cli: &Cli) -> ConfigPath {
    if let Some(path) = &cli.config {
        return ConfigPath::Explicit(path.clone());
    }
    if let Ok(path) = std::env::var("FILEREAPER_CONFIG") {
        return ConfigPath::Explicit(PathBuf::from(path));
    }
    let local = PathBuf::from("config/filereaper.toml");
    if local.exists() {
        return ConfigPath::Fallback(local);
    }
    match ProjectDirs::from("org", "filereaper", "filereaper") {
        Some(dirs) => ConfigPath::Fallback(dirs.config_dir().join("filereaper.toml")),
        None => ConfigPath::Fallback(local),
    }
}

fn parse(text: &str) -> Result<FileConfig> {
    toml::from_str(text).context("invalid config file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "FILEREAPER_CONFIG",
            "FILEREAPER_STORAGE_ROOT",
            "FILEREAPER_DATABASE",
            "FILEREAPER_LOGGING",
        ] {
            std::env::remove_var(var);
        }
    }

    fn write_cfg(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filereaper.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    #[serial]
    fn file_values_and_defaults() {
        clear_env();
        let (_dir, path) = write_cfg(
            "[storage]\nroot = \"/srv/public\"\n[records]\ndatabase = \"/srv/app.sqlite\"\n",
        );
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.storage_root, PathBuf::from("/srv/public"));
        assert_eq!(cfg.database, PathBuf::from("/srv/app.sqlite"));
        assert_eq!(cfg.abstract_types, vec!["Model", "BaseModel"]);
        assert!(cfg.record_types.is_none());
        assert!(cfg.strip_prefixes.is_empty());
        assert!(cfg.logging_enabled);
        assert!(!cfg.dry_run);
    }

    #[test]
    #[serial]
    fn full_file_config() {
        clear_env();
        let (_dir, path) = write_cfg(
            r#"
[storage]
root = "public"
strip_prefixes = ["storage/"]

[records]
database = "app.sqlite"
types = ["users", "posts"]
abstract_types = ["Base"]

[logging]
enabled = false
"#,
        );
        let cli = Cli {
            config: Some(path),
            dry_run: true,
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.record_types, Some(vec!["users".into(), "posts".into()]));
        assert_eq!(cfg.abstract_types, vec!["Base"]);
        assert_eq!(cfg.strip_prefixes, vec!["storage/"]);
        assert!(!cfg.logging_enabled);
        assert!(cfg.dry_run);
    }

    #[test]
    #[serial]
    fn precedence_cli_env_file() {
        clear_env();
        let (_dir, path) =
            write_cfg("[storage]\nroot = \"file\"\n[records]\ndatabase = \"file.db\"\n");
        std::env::set_var("FILEREAPER_STORAGE_ROOT", "env");
        std::env::set_var("FILEREAPER_DATABASE", "env.db");
        let cli = Cli {
            config: Some(path),
            storage_root: Some(PathBuf::from("cli")),
            ..Default::default()
        };
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.storage_root, PathBuf::from("cli"));
        assert_eq!(cfg.database, PathBuf::from("env.db"));
        clear_env();
    }

    #[test]
    #[serial]
    fn config_path_from_env() {
        clear_env();
        let (_dir, path) = write_cfg(
            "[storage]\nroot = \"r\"\n[records]\ndatabase = \"d\"\n[logging]\nenabled = false\n",
        );
        std::env::set_var("FILEREAPER_CONFIG", &path);
        std::env::set_var("FILEREAPER_LOGGING", "true");
        let cfg = Config::load(&Cli::default()).unwrap();
        assert_eq!(cfg.storage_root, PathBuf::from("r"));
        assert!(cfg.logging_enabled);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_explicit_config_fails() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    #[serial]
    fn invalid_toml_fails() {
        clear_env();
        let (_dir, path) = write_cfg("[storage\nroot=");
        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    #[serial]
    fn storage_root_and_database_required() {
        clear_env();
        let (_dir, path) = write_cfg("[records]\ndatabase = \"d\"\n");
        let cli = Cli {
            config: Some(path.clone()),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_err());

        let cli = Cli {
            config: Some(path),
            storage_root: Some(PathBuf::from("root")),
            ..Default::default()
        };
        assert!(Config::load(&cli).is_ok());
    }
}
