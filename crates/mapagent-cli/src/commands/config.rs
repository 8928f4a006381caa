use anyhow::{Context, Result};
use colored::Colorize;
use mapagent_core::SessionConfig;
use mapagent_infrastructure::ConfigStorage;
use std::path::PathBuf;

/// Opens the config file given on the command line, or the default one.
pub fn storage(path: Option<PathBuf>) -> Result<ConfigStorage> {
    match path {
        Some(path) => Ok(ConfigStorage::new(path)),
        None => ConfigStorage::default_location().context("Failed to locate config directory"),
    }
}

pub fn show(storage: &ConfigStorage) -> Result<()> {
    let config = storage
        .load_or_default()
        .with_context(|| format!("Failed to load {}", storage.path().display()))?;

    let source = if storage.path().exists() {
        storage.path().display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    println!("{}", format!("# Effective config ({})", source).cyan());
    print!("{}", config.to_toml_string()?);
    Ok(())
}

pub fn init(storage: &ConfigStorage, force: bool) -> Result<()> {
    if storage.path().exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            storage.path().display()
        );
    }

    storage
        .save(&SessionConfig::default())
        .with_context(|| format!("Failed to write {}", storage.path().display()))?;

    println!(
        "{}",
        format!("Wrote default config to {}", storage.path().display()).green()
    );
    Ok(())
}
