//! Daemon configuration with TOML file support.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use points_utils::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration for the points daemon.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes. Bounds the on-disk ledger size.
    pub map_size_mb: usize,

    /// Address the HTTP server binds to.
    pub bind_address: IpAddr,

    /// HTTP port.
    pub rpc_port: u16,

    pub log_format: LogFormat,

    /// Filter used when `RUST_LOG` is unset, e.g. `"info"` or `"debug,points_ledger=trace"`.
    pub log_level: String,
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./points_data"),
            map_size_mb: 64,
            bind_address: IpAddr::from([127, 0, 0, 1]),
            rpc_port: 8000,
            log_format: LogFormat::Human,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = DaemonConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(config.rpc_port, 8000);
        assert_eq!(config.map_size_mb, 64);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.data_dir, PathBuf::from("./points_data"));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            bind_address = "0.0.0.0"
            log_format = "json"
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.bind_address, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            DaemonConfig::from_toml_str("log_format = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DaemonConfig::from_toml_str("rpc_port = 70000"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.toml");
        std::fs::write(&path, "map_size_mb = 128\n").unwrap();
        let config = DaemonConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.map_size_mb, 128);
        assert_eq!(config.map_size_bytes(), 128 * 1024 * 1024);
    }

    #[test]
    fn missing_file_returns_read_error() {
        let err = DaemonConfig::from_toml_file(Path::new("/nonexistent/points.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
