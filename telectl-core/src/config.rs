//! telectl configuration
//!
//! Priority order (highest to lowest):
//! 1. Command-line flags (applied by the CLI)
//! 2. Environment variables (`DATABASE_URL`, `TELECTL_ENDPOINT`,
//!    `TELECTL_QUERY_SERVICE_ENDPOINT`), including `~/.telectl/.env`
//! 3. `~/.telectl/config.toml`
//! 4. Built-in defaults

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, Result};

/// Get the telectl config directory path (~/.telectl)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".telectl"))
}

/// Load `.env` from the current directory and then `~/.telectl/.env`.
///
/// dotenvy never overwrites variables that are already set, so the
/// current directory wins over the global file and the real environment
/// wins over both.
///
/// Runs before any tracing subscriber exists, so a broken global file is
/// reported straight to stderr.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
    }

    if let Some(env_file) = config_dir().map(|d| d.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => debug!("Loaded .env from {}", env_file.display()),
                Err(e) => eprintln!("warning: Failed to load {}: {}", env_file.display(), e),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelectlConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub client: ClientSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Allow any CORS origin instead of localhost only
    #[serde(default)]
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    /// telectl server the CLI talks to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Query service used for attribute-key autocomplete
    #[serde(default = "default_query_service_endpoint")]
    pub query_service_endpoint: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            query_service_endpoint: default_query_service_endpoint(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3040))
}

fn default_max_connections() -> u32 {
    5
}

fn default_endpoint() -> String {
    "http://127.0.0.1:3040".to_string()
}

fn default_query_service_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl TelectlConfig {
    /// Config file path: ~/.telectl/config.toml
    pub fn config_path() -> PathBuf {
        config_dir()
            .unwrap_or_else(|| PathBuf::from(".telectl"))
            .join("config.toml")
    }

    /// Load from the default path, falling back to defaults when the file is
    /// missing or unreadable, then apply environment overrides.
    pub fn load() -> Self {
        let path = Self::config_path();
        let mut config = if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => {
                    debug!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env();
        config
    }

    /// Strictly parse a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::config(path, e.to_string()))?;
        toml::from_str(&content).map_err(|e| CoreError::config(path, e.to_string()))
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = Some(url);
            }
        }
        if let Ok(endpoint) = env::var("TELECTL_ENDPOINT") {
            if !endpoint.is_empty() {
                self.client.endpoint = endpoint;
            }
        }
        if let Ok(endpoint) = env::var("TELECTL_QUERY_SERVICE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.client.query_service_endpoint = endpoint;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = TelectlConfig::default();
        assert_eq!(config.server.bind.port(), 3040);
        assert!(!config.server.cors_permissive);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn config_dir_ends_with_telectl() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with(".telectl"));
        }
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "postgres://localhost/telectl"

[client]
endpoint = "http://console:3040"
"#
        )
        .unwrap();

        let config = TelectlConfig::load_from(file.path()).unwrap();
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://localhost/telectl")
        );
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.client.endpoint, "http://console:3040");
        assert_eq!(config.client.query_service_endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.server.bind.port(), 3040);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = ").unwrap();
        let err = TelectlConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn load_never_panics() {
        let _ = TelectlConfig::load();
    }
}
