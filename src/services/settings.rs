use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Mode the user picked last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    #[default]
    Normal,
    Affinity,
    Suspend,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaunchMode::Normal => "normal",
            LaunchMode::Affinity => "affinity",
            LaunchMode::Suspend => "suspend",
        };
        f.write_str(name)
    }
}

/// Persisted tool settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Absolute path to the game launcher executable
    #[serde(default)]
    pub game_path: String,

    /// Seconds to wait for a process to show up (default: 30)
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout: u32,

    /// Exit after the first completed action
    #[serde(default)]
    pub auto_close: bool,

    #[serde(default)]
    pub last_mode: LaunchMode,
}

fn default_launch_timeout() -> u32 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_path: String::new(),
            launch_timeout: default_launch_timeout(),
            auto_close: false,
            last_mode: LaunchMode::Normal,
        }
    }
}

/// Loads and saves `config.json` next to the executable.
pub struct SettingsService {
    file_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_path(dir.join("config.json"))
    }

    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        Self { file_path: file_path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// A missing file yields the defaults; a broken one is an error.
    pub fn load(&self) -> Result<Config> {
        if !self.file_path.exists() {
            debug!("no config at {}, using defaults", self.file_path.display());
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("failed to read {}", self.file_path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", self.file_path.display()))
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.file_path, content)
            .with_context(|| format!("failed to write {}", self.file_path.display()))?;
        debug!("saved config to {}", self.file_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let service = SettingsService::with_path(dir.path().join("config.json"));

        let config = service.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.launch_timeout, 30);
        assert_eq!(config.last_mode, LaunchMode::Normal);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let service = SettingsService::with_path(dir.path().join("config.json"));
        let config = Config {
            game_path: r"D:\Delta Force\launcher\delta_force_launcher.exe".into(),
            launch_timeout: 45,
            auto_close: true,
            last_mode: LaunchMode::Affinity,
        };

        service.save(&config).unwrap();
        assert_eq!(service.load().unwrap(), config);

        let raw = fs::read_to_string(service.path()).unwrap();
        assert!(raw.contains("\"last_mode\": \"affinity\""));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "game_path": "C:\\game\\delta_force_launcher.exe", "auto_close": true }"#).unwrap();

        let config = SettingsService::with_path(&path).load().unwrap();
        assert_eq!(config.game_path, r"C:\game\delta_force_launcher.exe");
        assert!(config.auto_close);
        assert_eq!(config.launch_timeout, 30);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SettingsService::with_path(&path).load().unwrap_err();
        assert!(err.to_string().starts_with("failed to parse"));
    }
}
