//! mongobject.toml configuration handling
//!
//! The file holds a `ConnectionConfig`; command line flags are layered on
//! top of it.

use anyhow::{Context, Result};
use mongobject::ConnectionConfig;
use std::path::Path;

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mongobject.toml";

/// Load a config file
pub fn load(path: &Path) -> Result<ConnectionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Save a config file
pub fn save(config: &ConnectionConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Load `path` if given, else `mongobject.toml` when present, else defaults
pub fn load_or_default(path: Option<&Path>) -> Result<ConnectionConfig> {
    match path {
        Some(path) => load(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                load(default)
            } else {
                Ok(ConnectionConfig::default())
            }
        }
    }
}

/// Connection flags given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub uri: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub tls: Option<bool>,
}

impl Overrides {
    /// Layer the flags over a file config.
    ///
    /// Addressing is replaced as a whole: a `--uri` flag drops the file's
    /// host/port and `--host`/`--port` drop the file's URI. A URI flag given
    /// together with host/port flags is kept as is, so the address check
    /// rejects it as ambiguous.
    pub fn apply(self, mut config: ConnectionConfig) -> ConnectionConfig {
        let host_flags = self.host.is_some() || self.port.is_some();
        match (self.uri, host_flags) {
            (Some(uri), false) => {
                config.uri = Some(uri);
                config.host = None;
                config.port = None;
            }
            (uri, true) => {
                config.uri = uri;
                if self.host.is_some() {
                    config.host = self.host;
                }
                if self.port.is_some() {
                    config.port = self.port;
                }
            }
            (None, false) => {}
        }
        if self.database.is_some() {
            config.database = self.database;
        }
        if self.collection.is_some() {
            config.collection = self.collection;
        }
        if self.tls.is_some() {
            config.tls = self.tls;
        }
        config
    }
}
