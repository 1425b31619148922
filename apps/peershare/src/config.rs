//! Peer configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/peershare/peershare.toml`
//! - Windows: `%APPDATA%/peershare/peershare.toml`

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use peershare_protocol::constants::{DEFAULT_CHUNK_INTERVAL, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use peershare_transfer::TransferConfig;
use serde::{Deserialize, Serialize};

/// Peer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Display name of this peer (hostname by default).
    #[serde(default = "default_name")]
    pub name: String,

    /// Payload bytes per chunk when sending.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay between two chunk sends, in milliseconds.
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,

    /// Largest chunk payload accepted when receiving.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Where received files are saved.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Address `receive` listens on when none is given.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "PeerShare".into())
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_interval_ms() -> u64 {
    DEFAULT_CHUNK_INTERVAL.as_millis() as u64
}

fn default_max_chunk_size() -> usize {
    MAX_CHUNK_SIZE
}

fn default_output_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    home.join("Downloads").join("peershare")
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 7878))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            chunk_size: default_chunk_size(),
            chunk_interval_ms: default_chunk_interval_ms(),
            max_chunk_size: default_max_chunk_size(),
            output_dir: default_output_dir(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Transfer tunables derived from this configuration.
    pub fn transfer(&self) -> TransferConfig {
        TransferConfig {
            chunk_size: self.chunk_size,
            chunk_interval: Duration::from_millis(self.chunk_interval_ms),
            max_chunk_size: self.max_chunk_size,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("peershare")
            .join("peershare.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("peershare").join("peershare.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/peershare/peershare.toml"))
    }
}
