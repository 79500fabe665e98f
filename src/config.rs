//! Process configuration, persisted as TOML.
//!
//! Every field has a serde default, so a partial file (or none at all) yields a
//! working configuration pointing at a local GraphDB repository.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{GraphStore, HttpStore, MemoryStore, StoreResult};
use crate::vocab::ns;

/// Errors from configuration loading and saving.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(kg::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(kg::config::parse),
        help("Check the TOML syntax; unknown backends must be `http` or `memory`.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(kg::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Which persistence adapter to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Memory,
}

/// Triple store location and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Server base url, e.g. `http://localhost:7200`.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_url() -> String {
    "http://localhost:7200".into()
}
fn default_repository() -> String {
    "SINDIT".into()
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            url: default_url(),
            repository: default_repository(),
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Repository endpoint: `<url>/repositories/<repository>`.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/repositories/{}",
            self.url.trim_end_matches('/'),
            self.repository
        )
    }

    /// Build the configured adapter.
    pub fn open(&self) -> StoreResult<Arc<dyn GraphStore>> {
        Ok(match self.backend {
            Backend::Http => Arc::new(HttpStore::new(self)),
            Backend::Memory => Arc::new(MemoryStore::new()?),
        })
    }
}

/// Startup connection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Fixed delay between connectivity checks.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Give up after this many attempts; absent means retry forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_retry_delay_ms() -> u64 {
    10_000
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            max_attempts: None,
        }
    }
}

impl ConnectConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Named-graph settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Prefix applied to graph identifiers that are not absolute.
    #[serde(default = "default_base_namespace")]
    pub base_namespace: String,
    /// Graph active at startup.
    #[serde(default = "default_graph")]
    pub default_graph: String,
}

fn default_base_namespace() -> String {
    ns::WORKSPACE.into()
}
fn default_graph() -> String {
    format!("{}DefaultGraph", ns::WORKSPACE)
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_namespace: default_base_namespace(),
            default_graph: default_graph(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KgConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub connect: ConnectConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

impl KgConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_graphdb() {
        let config = KgConfig::default();
        assert_eq!(
            config.store.endpoint(),
            "http://localhost:7200/repositories/SINDIT"
        );
        assert_eq!(config.connect.retry_delay(), Duration::from_secs(10));
        assert_eq!(
            config.graph.default_graph,
            "http://sindit.sintef.no/2.0#DefaultGraph"
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: KgConfig = toml::from_str(
            r#"
            [store]
            backend = "memory"

            [connect]
            max_attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.repository, "SINDIT");
        assert_eq!(config.connect.max_attempts, Some(3));
        assert_eq!(config.connect.retry_delay_ms, 10_000);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("asset-kg.toml");
        let mut config = KgConfig::default();
        config.store.username = Some("admin".into());
        config.graph.default_graph = "urn:graph:plant".into();
        config.save(&path).unwrap();

        let loaded = KgConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = KgConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn memory_backend_opens() {
        let config = StoreConfig {
            backend: Backend::Memory,
            ..StoreConfig::default()
        };
        let store = config.open().unwrap();
        assert_eq!(store.name(), "memory");
        assert!(store.check_connectivity());
    }
}
