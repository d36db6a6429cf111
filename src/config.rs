//! Configuration management for the connection viewer.
//!
//! Handles loading and saving configuration from JSONC files.
//! Manages the backend address, request settings and display defaults.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that sets the initial half-connection toggle.
pub const SHOW_HALF_ENV: &str = "CONNVIEW_SHOW_HALF_CONNECTIONS";

/// Application configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture backend base URL
    pub base_url: String,
    /// Whether half-connections are shown on startup
    pub show_half_connections: bool,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Automatic refresh interval in seconds (0 disables)
    pub refresh_interval_secs: u64,
    /// Log file path (relative to config dir or absolute)
    pub log_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8899".to_string(),
            show_half_connections: false,
            request_timeout_secs: 10,
            refresh_interval_secs: 0,
            log_path: "connview.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file.
    ///
    /// # Arguments
    /// * `path` - Optional path to config file. If None, uses default location.
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    ///
    /// # Details
    /// Searches for config file in:
    /// 1. Provided path (if given)
    /// 2. `$XDG_CONFIG_HOME/connview/config.jsonc`
    /// 3. `~/.config/connview/config.jsonc`
    ///
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::default_config_path()?
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = serde_json::from_str(&strip_line_comments(&content))
            .with_context(|| format!("Failed to deserialize config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// # Arguments
    /// * `value` - Value of [`SHOW_HALF_ENV`], if set
    ///
    /// # Details
    /// Only the literal `true` enables half-connections; any other value
    /// disables them. An unset variable leaves the file value untouched.
    pub fn apply_env(&mut self, value: Option<&str>) {
        if let Some(value) = value {
            self.show_half_connections = value.trim() == "true";
        }
    }

    /// Save configuration to file.
    ///
    /// # Arguments
    /// * `path` - Optional path to config file. If None, uses default location.
    ///
    /// # Details
    /// Creates config directory if it doesn't exist.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::default_config_path()?
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, json)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get default configuration file path.
    ///
    /// # Details
    /// Returns `$XDG_CONFIG_HOME/connview/config.jsonc` or `~/.config/connview/config.jsonc`.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::config_home()?.join("config.jsonc"))
    }

    /// Get log file path.
    ///
    /// # Details
    /// If log_path is absolute, returns it as-is.
    /// Otherwise, returns path relative to config directory.
    pub fn log_file_path(&self) -> Result<PathBuf> {
        let log_path = Path::new(&self.log_path);
        if log_path.is_absolute() {
            Ok(log_path.to_path_buf())
        } else {
            Ok(Self::config_home()?.join(log_path))
        }
    }

    fn config_home() -> Result<PathBuf> {
        let config_dir =
            config_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine config directory"))?;
        Ok(config_dir.join("connview"))
    }
}

/// Strip `//` line comments outside of string literals.
fn strip_line_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            let mut in_string = false;
            let mut escaped = false;
            let bytes = line.as_bytes();
            for (i, &b) in bytes.iter().enumerate() {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' if in_string => escaped = true,
                    b'"' => in_string = !in_string,
                    b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => {
                        return line[..i].trim_end();
                    }
                    _ => {}
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
