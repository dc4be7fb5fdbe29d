use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Preferences;

const APP_DIR: &str = "daily-quotes";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Name recorded on quotes added from this device.
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_watch_interval")]
    pub watch_interval_ms: u64,

    /// Used until the user changes the corresponding setting.
    #[serde(default)]
    pub defaults: DefaultSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub allow_notifications: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub spacing_minutes: u32,
    pub query: String,
    pub filter: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        let prefs = Preferences::default();
        Self {
            allow_notifications: prefs.allow_notifications,
            start_time: prefs.start_time,
            end_time: prefs.end_time,
            spacing_minutes: prefs.spacing_minutes,
            query: prefs.query,
            filter: prefs.filter,
        }
    }
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("quotes.db").to_string_lossy().to_string()
}

fn default_username() -> String {
    "me".to_string()
}

fn default_watch_interval() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            username: default_username(),
            watch_interval_ms: default_watch_interval(),
            defaults: DefaultSettings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, writing a default config there first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        self.default_preferences()
            .validate()
            .map_err(|e| AppError::Config(format!("Invalid [defaults]: {}", e)))?;
        if self.watch_interval_ms == 0 {
            return Err(AppError::Config("watch_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn default_preferences(&self) -> Preferences {
        let d = &self.defaults;
        Preferences {
            allow_notifications: d.allow_notifications,
            start_time: d.start_time,
            end_time: d.end_time,
            spacing_minutes: d.spacing_minutes,
            query: d.query.clone(),
            filter: d.filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = assert_ok!(Config::load_from(&path));
        assert!(path.exists());
        assert_eq!(config.username, "me");
        assert_eq!(config.default_preferences(), Preferences::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/tmp/quotes.db"
username = "sam"

[defaults]
spacing_minutes = 10
start_time = "07:30:00"
"#,
        )
        .unwrap();

        let config = assert_ok!(Config::load_from(&path));
        assert_eq!(config.db_path, "/tmp/quotes.db");
        assert_eq!(config.username, "sam");
        assert_eq!(config.watch_interval_ms, 1000);

        let prefs = config.default_preferences();
        assert_eq!(prefs.spacing_minutes, 10);
        assert_eq!(prefs.start_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(prefs.filter, "Subject");
    }

    #[test]
    fn test_zero_spacing_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\nspacing_minutes = 0\n").unwrap();

        let err = assert_err!(Config::load_from(&path));
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_inverted_default_window_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\nstart_time = \"18:00:00\"\nend_time = \"08:00:00\"\n",
        )
        .unwrap();

        let err = assert_err!(Config::load_from(&path));
        assert!(err.to_string().contains("18:00:00"));
    }

    #[test]
    fn test_malformed_config_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "username = [").unwrap();

        let err = assert_err!(Config::load_from(&path));
        assert!(matches!(err, AppError::Toml(_)));
    }
}
