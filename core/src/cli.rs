use clap::Parser;
use std::path::PathBuf;

/// Delete files in a storage directory that no record references anymore.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory whose files are subject to cleanup.
    #[arg(long)]
    pub storage_root: Option<PathBuf>,
    /// SQLite database holding the application's records.
    #[arg(long)]
    pub database: Option<PathBuf>,
    /// Report orphaned files without deleting them.
    #[arg(long)]
    pub dry_run: bool,
    /// Enable or disable logging (true/false).
    #[arg(long)]
    pub logging: Option<bool>,
}
