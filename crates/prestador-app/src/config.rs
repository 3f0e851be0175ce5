//! Application configuration.
//!
//! Loaded from `~/.config/prestador/config.ron` when present, or from the
//! path given with `--config`. Every field is optional:
//!
//! ```ron
//! (
//!     sign_in_path: "/sign-in",
//!     home_path: "/home",
//!     database: Some("/var/lib/prestador/prestador.db"),
//! )
//! ```

use std::path::{Path, PathBuf};

use prestador_client::RoutePaths;
use prestador_client::constants::{DEFAULT_HOME_PATH, DEFAULT_SIGN_IN_PATH};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where signed-out users are sent.
    pub sign_in_path: String,
    /// Where signed-in users land.
    pub home_path: String,
    /// SQLite database file. Defaults to the platform data directory.
    pub database: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
            database: None,
        }
    }
}

impl AppConfig {
    /// `~/.config/prestador/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prestador").join("config.ron"))
    }

    /// `~/.local/share/prestador/prestador.db`
    pub fn default_database() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prestador")
            .join("prestador.db")
    }

    /// Load `explicit` if given, else the default file if it exists, else
    /// defaults. A missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn route_paths(&self) -> RoutePaths {
        RoutePaths {
            sign_in: self.sign_in_path.clone(),
            home: self.home_path.clone(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(Self::default_database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("()").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.route_paths(), RoutePaths::default());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::parse(r#"(sign_in_path: "/entrar", database: Some("/tmp/p.db"))"#)
            .unwrap();
        assert_eq!(config.sign_in_path, "/entrar");
        assert_eq!(config.home_path, DEFAULT_HOME_PATH);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/p.db"));
    }

    #[test]
    fn test_bad_ron_is_reported() {
        assert!(matches!(
            AppConfig::parse("(sign_in_path: 42)"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, r#"(home_path: "/inicio")"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.home_path, "/inicio");

        let missing = dir.path().join("nope.ron");
        assert!(matches!(AppConfig::load(Some(&missing)), Err(ConfigError::Io(_))));
    }
}
