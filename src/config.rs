//! Configuration loading and management.
//!
//! Sources, lowest priority first: built-in defaults, a YAML file
//! (`--config`, else `task-tracker.yaml` in the working directory),
//! environment variables, then command-line flags.
//!
//! ## Environment Variables
//! - `TASK_TRACKER_DB_PATH` - Database path
//! - `TASK_TRACKER_MEDIA_DIR` - Upload directory
//! - `TASK_TRACKER_HOST` - Bind address
//! - `TASK_TRACKER_PORT` - Listen port

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "task-tracker.yaml";

/// Default port for the web server.
pub const DEFAULT_PORT: u16 = 8000;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root directory for uploaded comment media.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Lifetime of a login session in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,

    /// Largest accepted request body (comment uploads) in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            media_dir: default_media_dir(),
            session_ttl_hours: default_session_ttl_hours(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".task-tracker/tasks.db")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from(".task-tracker/media")
}

fn default_session_ttl_hours() -> u64 {
    24 * 14 // two weeks
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours.saturating_mul(3600))
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Load the explicit file if given, else the default file if present, else defaults.
    /// Environment overrides are applied on top.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `TASK_TRACKER_*` overrides read through `var`.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = var("TASK_TRACKER_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(media_dir) = var("TASK_TRACKER_MEDIA_DIR") {
            self.server.media_dir = PathBuf::from(media_dir);
        }

        if let Some(host) = var("TASK_TRACKER_HOST") {
            match host.parse() {
                Ok(host) => self.server.host = host,
                Err(_) => warn!("Ignoring invalid TASK_TRACKER_HOST: {}", host),
            }
        }

        if let Some(port) = var("TASK_TRACKER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid TASK_TRACKER_PORT: {}", port),
            }
        }
    }

    /// Ensure the database and media directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(&self.server.media_dir)?;
        Ok(())
    }
}
