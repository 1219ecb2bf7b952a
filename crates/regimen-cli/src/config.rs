//! Configuration file management for regimen.
//!
//! Provides a TOML-based config file at `~/.config/regimen/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use regimen_db::config::DbConfig;

/// Environment variable overriding the HTTP bind address.
pub const BIND_ENV: &str = "REGIMEN_BIND";
/// Environment variable overriding the HTTP port.
pub const PORT_ENV: &str = "REGIMEN_PORT";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the regimen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/regimen` or `~/.config/regimen`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("regimen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("regimen")
}

/// Return the path to the regimen config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct RegimenConfig {
    pub db_config: DbConfig,
    pub bind: String,
    pub port: u16,
}

impl RegimenConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `REGIMEN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Bind: `cli_bind` > `REGIMEN_BIND` > `server.bind` > `127.0.0.1`
    /// - Port: `cli_port` > `REGIMEN_PORT` > `server.port` > `3000`
    pub fn resolve(
        cli_db_url: Option<&str>,
        cli_bind: Option<&str>,
        cli_port: Option<u16>,
    ) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let mut db_config = DbConfig::new(db_url);
        if let Some(max) = file_config
            .as_ref()
            .and_then(|cfg| cfg.database.max_connections)
        {
            db_config = db_config.with_max_connections(max);
        }

        let bind = if let Some(bind) = cli_bind {
            bind.to_string()
        } else if let Ok(bind) = std::env::var(BIND_ENV) {
            bind
        } else if let Some(ref cfg) = file_config {
            cfg.server.bind.clone()
        } else {
            default_bind()
        };

        let port = if let Some(port) = cli_port {
            port
        } else if let Ok(raw) = std::env::var(PORT_ENV) {
            raw.parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {raw:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.server.port
        } else {
            DEFAULT_PORT
        };

        Ok(Self {
            db_config,
            bind,
            port,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
