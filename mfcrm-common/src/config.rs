//! Configuration loading and database location resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "MFCRM_DATABASE";

/// Database file used when nothing else is configured
pub const DEFAULT_DATABASE_FILE: &str = "crm.db";

/// Optional TOML configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// SQLite URL or plain file path
    pub database_url: Option<String>,
    /// HTTP port override
    pub port: Option<u16>,
}

impl TomlConfig {
    /// Parse a config file; a missing or malformed file yields defaults
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Database location resolution, highest priority first:
/// 1. Command-line argument (clap also fills it from `DATABASE_URL`)
/// 2. `MFCRM_DATABASE` environment variable
/// 3. `database_url` in the TOML config file
/// 4. `crm.db` in the working directory
#[derive(Debug, Clone)]
pub struct DatabaseResolver {
    cli_arg: Option<String>,
    env_var_name: String,
    config_file: Option<PathBuf>,
}

impl DatabaseResolver {
    pub fn new(cli_arg: Option<String>) -> Self {
        Self {
            cli_arg,
            env_var_name: DATABASE_ENV_VAR.to_string(),
            config_file: default_config_file(),
        }
    }

    /// Use an explicit config file instead of the platform location
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Resolve to a normalized `sqlite:` URL
    pub fn resolve(&self) -> Result<String> {
        if let Some(arg) = self.cli_arg.as_deref().filter(|s| !s.trim().is_empty()) {
            debug!("Database from command line");
            return normalize_database_url(arg);
        }

        if let Ok(value) = std::env::var(&self.env_var_name) {
            if !value.trim().is_empty() {
                debug!("Database from {}", self.env_var_name);
                return normalize_database_url(&value);
            }
        }

        if let Some(path) = &self.config_file {
            if let Some(url) = TomlConfig::load(path).database_url {
                debug!("Database from config file {}", path.display());
                return normalize_database_url(&url);
            }
        }

        normalize_database_url(DEFAULT_DATABASE_FILE)
    }
}

/// Turn a URL or bare path into a `sqlite:` URL.
///
/// Server databases are rejected; only SQLite is supported.
pub fn normalize_database_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Config("Database location is empty".to_string()));
    }

    if raw.starts_with("sqlite:") {
        return Ok(raw.to_string());
    }

    for scheme in ["postgres://", "postgresql://", "mysql://", "mariadb://"] {
        if raw.starts_with(scheme) {
            return Err(Error::Config(format!(
                "Only SQLite databases are supported (got {}...)",
                scheme
            )));
        }
    }

    Ok(format!("sqlite://{}", raw))
}

/// Platform config file: `<config dir>/mfcrm/config.toml`, then `/etc/mfcrm/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("mfcrm").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/mfcrm/config.toml");
    if cfg!(unix) && system_config.exists() {
        return Some(system_config);
    }

    None
}
