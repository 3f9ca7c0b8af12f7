//! Server configuration read from the environment.

use std::path::PathBuf;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Settings needed to start the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Incident CSV. Searched for in the usual data directories when unset.
    pub data_path: Option<PathBuf>,
    /// District boundary GeoJSON. Searched for when unset.
    pub districts_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            data_path: None,
            districts_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `CRIME_DATA_PATH`, and `DISTRICTS_PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = non_empty("PORT").map_or(DEFAULT_PORT, |raw| {
            raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{raw}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            })
        });

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            data_path: non_empty("CRIME_DATA_PATH").map(PathBuf::from),
            districts_path: non_empty("DISTRICTS_PATH").map(PathBuf::from),
        }
    }
}
