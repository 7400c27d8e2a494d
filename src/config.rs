//! Dashboard configuration: defaults, optional JSON file, environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Config file path override.
pub const CONFIG_ENV: &str = "COVID_DASHBOARD_CONFIG";
/// Data file path override.
pub const DATA_ENV: &str = "COVID_DASHBOARD_DATA";
/// Picked up from the working directory when no override is set.
pub const DEFAULT_CONFIG_FILE: &str = "covid_dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    /// Regions preselected on startup, taken alphabetically.
    pub default_region_count: usize,
    pub show_combined: bool,
    pub export_dir: PathBuf,
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("covid_19_indonesia_clean.csv"),
            default_region_count: 3,
            show_combined: true,
            export_dir: PathBuf::from("exports"),
            export_width: 1200,
            export_height: 800,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the config file, then `COVID_DASHBOARD_DATA`, then the
    /// first positional argument.
    pub fn resolve(data_arg: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let candidate = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if explicit.is_some() || candidate.is_file() {
            info!(path = %candidate.display(), "reading config");
            Self::from_file(&candidate)?
        } else {
            debug!("no config file, using defaults");
            Self::default()
        };

        if let Some(path) = env::var_os(DATA_ENV) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(path) = data_arg {
            config.data_path = path;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_path": "other.csv", "show_combined": false }}"#).unwrap();
        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.data_path, PathBuf::from("other.csv"));
        assert!(!config.show_combined);
        assert_eq!(config.default_region_count, 3);
        assert_eq!(config.export_width, 1200);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = DashboardConfig::from_file(Path::new("/no/such/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    // Only test touching the process environment.
    #[test]
    fn resolve_applies_file_then_env_then_argument() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_path": "from_file.csv", "default_region_count": 5 }}"#).unwrap();
        env::set_var(CONFIG_ENV, file.path());
        env::remove_var(DATA_ENV);

        let config = DashboardConfig::resolve(None).unwrap();
        assert_eq!(config.data_path, PathBuf::from("from_file.csv"));
        assert_eq!(config.default_region_count, 5);

        env::set_var(DATA_ENV, "from_env.csv");
        let config = DashboardConfig::resolve(None).unwrap();
        assert_eq!(config.data_path, PathBuf::from("from_env.csv"));
        assert_eq!(config.default_region_count, 5);

        let config = DashboardConfig::resolve(Some(PathBuf::from("from_arg.csv"))).unwrap();
        assert_eq!(config.data_path, PathBuf::from("from_arg.csv"));

        env::set_var(CONFIG_ENV, "/no/such/dashboard.json");
        assert!(matches!(
            DashboardConfig::resolve(None),
            Err(ConfigError::Read { .. })
        ));

        env::remove_var(CONFIG_ENV);
        env::remove_var(DATA_ENV);
    }

    #[test]
    fn defaults_match_bundled_dataset() {
        let config = DashboardConfig::default();
        assert_eq!(config.data_path, PathBuf::from("covid_19_indonesia_clean.csv"));
        assert!(config.show_combined);
    }
}
