use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Store configuration, loaded from `colprof.toml`.
///
/// Backend discovery lives in the surrounding pipeline; this layer only
/// consumes the selected kind and the opaque endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColprofConfig {
    /// Backend kind, by registry name or code (e.g. "triple" or "3")
    pub backend: Option<String>,
    /// Backend endpoint; for the triple store, a database file path
    pub database: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("colprof.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".colprof").join("colprof.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ColprofConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ColprofConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ColprofConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
