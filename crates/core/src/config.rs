//! Application configuration.
//!
//! A TOML file under the platform config directory, layered with
//! `DEPBOARD_`-prefixed environment variables. A commented default file is
//! written on first run.

use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_STATION_FILE: &str = "station_codes.csv";
const DEFAULT_BASE_URL: &str = "https://api1.raildata.org.uk/1010-live-departure-board/LDBWS";
const DEFAULT_REFRESH_MINUTES: u64 = 5;

const DEFAULT_CONFIG: &str = r#"# depboard configuration.

# Bearer token for the live departure board service. May be overridden by a
# command-line argument.
#token = "00000000-0000-0000-0000-000000000000"

# Station list: one `DisplayName,Code` entry per line, no header.
#station_file = "station_codes.csv"

# Remote service base URL.
#base_url = "https://api1.raildata.org.uk/1010-live-departure-board/LDBWS"

# Minutes between automatic board refreshes.
#refresh_minutes = 5

# Serve synthetic boards instead of calling the live service.
#mock = false
"#;

/// Fatal configuration failures, reported before the interactive loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// The default configuration file could not be written.
    #[error("failed to write default configuration {path}: {source}")]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Resolved application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bearer token, when configured. Arguments take precedence.
    pub token: Option<String>,
    /// Path to the station list file.
    pub station_file: PathBuf,
    /// Remote service base URL.
    pub base_url: String,
    /// Minutes between automatic refreshes.
    pub refresh_minutes: u64,
    /// Serve synthetic boards instead of calling the live service.
    pub mock: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: None,
            station_file: PathBuf::from(DEFAULT_STATION_FILE),
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_minutes: DEFAULT_REFRESH_MINUTES,
            mock: false,
        }
    }
}

impl AppConfig {
    /// Default configuration file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depboard")
            .join("config.toml")
    }

    /// Load configuration from the default location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from an explicit file path and the environment.
    /// A missing file yields the defaults.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.into()).required(false))
            .add_source(config::Environment::with_prefix("DEPBOARD"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Period between automatic refreshes.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes * 60)
    }
}

/// Write the commented default configuration file if none exists yet.
/// Returns the path either way.
pub fn ensure_default_config() -> Result<PathBuf, ConfigError> {
    let path = AppConfig::config_path();
    write_default(&path)?;
    Ok(path)
}

fn write_default(path: &PathBuf) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
    }
    fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.token, None);
        assert_eq!(config.station_file, PathBuf::from(DEFAULT_STATION_FILE));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.refresh_period(), Duration::from_secs(300));
        assert!(!config.mock);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "token = \"12345678-1234-1234-1234-1234567890ab\"\nrefresh_minutes = 1\nmock = true\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(
            config.token.as_deref(),
            Some("12345678-1234-1234-1234-1234567890ab")
        );
        assert_eq!(config.refresh_period(), Duration::from_secs(60));
        assert!(config.mock);
    }

    #[test]
    fn default_file_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depboard").join("config.toml");

        write_default(&path).unwrap();
        assert!(path.exists());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("refresh_minutes"));

        // A second call must not clobber user edits.
        fs::write(&path, "mock = true\n").unwrap();
        write_default(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "mock = true\n");
    }

    #[test]
    fn default_config_template_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.refresh_minutes, DEFAULT_REFRESH_MINUTES);
    }
}
