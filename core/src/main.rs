use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use filereaper::{cli::Cli, config::Config, sqlite::SqliteSource, Reaper, StorageRoot};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;
    let level = if cfg.logging_enabled { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut source = SqliteSource::open(&cfg.database)
        .with_context(|| format!("opening database {}", cfg.database.display()))?;
    if let Some(types) = cfg.record_types.clone() {
        source = source.with_types(types);
    }

    let root = StorageRoot::new(cfg.storage_root.clone())
        .with_strip_prefixes(cfg.strip_prefixes.clone());
    Reaper::new(root)
        .with_abstract_types(cfg.abstract_types.clone())
        .dry_run(cfg.dry_run)
        .run(&source)
        .context("cleaning storage")?;
    Ok(())
}
