//! Connection configuration
//!
//! `ConnectionConfig` is the serde-friendly description of where to connect
//! and what to operate on. `Address` is its resolved addressing mode.

use crate::{MongobjectError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const URI_SCHEMES: &[&str] = &["mongodb://", "mongodb+srv://"];

/// Resolved addressing mode of a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Address {
    /// Full connection string
    Uri { uri: String },
    /// Host name (optionally `host:port`) plus an explicit port
    Host { host: String, port: Option<u16> },
    /// Driver default, `localhost:27017`
    Default,
}

impl Address {
    /// Resolve the addressing mode from the three optional parameters.
    ///
    /// Empty strings count as absent. A URI cannot be combined with a host or
    /// a port, and a port needs a host.
    pub fn resolve(uri: Option<&str>, host: Option<&str>, port: Option<u16>) -> Result<Self> {
        let uri = uri.map(str::trim).filter(|s| !s.is_empty());
        let host = host.map(str::trim).filter(|s| !s.is_empty());

        match (uri, host, port) {
            (Some(uri), None, None) => {
                if !URI_SCHEMES.iter().any(|scheme| uri.starts_with(scheme)) {
                    return Err(MongobjectError::Configuration(format!(
                        "URI must start with 'mongodb://' or 'mongodb+srv://': '{}'",
                        redact(uri)
                    )));
                }
                Ok(Address::Uri {
                    uri: uri.to_string(),
                })
            }
            (Some(_), _, _) => Err(MongobjectError::Configuration(
                "Ambiguous address: a URI cannot be combined with host or port".to_string(),
            )),
            (None, Some(host), port) => Ok(Address::Host {
                host: host.to_string(),
                port,
            }),
            (None, None, Some(port)) => Err(MongobjectError::Configuration(format!(
                "Port {} given without a host",
                port
            ))),
            (None, None, None) => Ok(Address::Default),
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            Address::Uri { uri } => Some(uri),
            _ => None,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            Address::Host { host, .. } => Some(host),
            _ => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Address::Host { port, .. } => *port,
            _ => None,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Uri { uri } => write!(f, "{}", redact(uri)),
            Address::Host { host, port: Some(port) } => write!(f, "{}:{}", host, port),
            Address::Host { host, port: None } => write!(f, "{}", host),
            Address::Default => write!(f, "localhost:27017"),
        }
    }
}

/// Hide the password of a connection string for logs and messages
fn redact(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://").map(|i| i + 3) else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => {
            let user = rest[..at].split(':').next().unwrap_or_default();
            format!("{}{}:***{}", &uri[..scheme_end], user, &rest[at..])
        }
        None => uri.to_string(),
    }
}

/// Connection pool configuration, applied over the driver defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 10)
    pub max_pool_size: Option<u32>,
    /// Seconds a connection can remain idle before being closed
    pub max_idle_time_secs: Option<u64>,
    /// Connection timeout in seconds (default: 10)
    pub connect_timeout_secs: Option<u64>,
    /// Server selection timeout in seconds (default: 30)
    pub server_selection_timeout_secs: Option<u64>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time_secs: None,
            connect_timeout_secs: Some(10),
            server_selection_timeout_secs: Some(30),
            app_name: Some("mongobject".to_string()),
        }
    }
}

impl PoolConfig {
    pub fn max_idle_time(&self) -> Option<Duration> {
        self.max_idle_time_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn server_selection_timeout(&self) -> Option<Duration> {
        self.server_selection_timeout_secs.map(Duration::from_secs)
    }
}

/// Everything a `Mongobject` needs to know before it connects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Force TLS on or off; `None` keeps whatever the URI or driver says
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    /// Pin the stable server API (v1)
    pub stable_api: bool,
    pub pool: PoolConfig,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the five recognised options
    pub fn from_parts(
        uri: Option<&str>,
        host: Option<&str>,
        port: Option<u16>,
        database: Option<&str>,
        collection: Option<&str>,
    ) -> Self {
        Self {
            uri: uri.map(str::to_string),
            host: host.map(str::to_string),
            port,
            database: database.map(str::to_string),
            collection: collection.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Resolve the effective addressing mode
    pub fn address(&self) -> Result<Address> {
        Address::resolve(self.uri.as_deref(), self.host.as_deref(), self.port)
    }

    /// Store a resolved address back into the raw fields
    pub(crate) fn set_address(&mut self, address: &Address) {
        self.uri = address.uri().map(str::to_string);
        self.host = address.host().map(str::to_string);
        self.port = address.port();
    }
}

/// Snapshot of a facade's configuration, as returned by `get_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub address: Address,
    pub database: Option<String>,
    pub collection: Option<String>,
}
