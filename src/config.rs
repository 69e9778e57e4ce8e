//! Configuration management for CVM

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Page size for `/validators` enumeration
    #[serde(default = "default_validators_per_page")]
    pub validators_per_page: u32,

    /// Page size for the staking module moniker query
    #[serde(default = "default_staking_page_limit")]
    pub staking_page_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Interval used with `--fast`
    #[serde(default = "default_fast_poll_interval")]
    pub fast_interval_ms: u64,

    /// Below this height the registry is refreshed on every poll
    #[serde(default = "default_bootstrap_height")]
    pub bootstrap_height: u64,

    /// Blocks between background registry refreshes
    #[serde(default = "default_refresh_every_blocks")]
    pub refresh_every_blocks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Minimum time between repaints
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// "dark" or "light"
    #[serde(default = "default_theme")]
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Append logs here instead of stderr
    #[serde(default)]
    pub file: Option<String>,

    /// Filter directive, e.g. "info" or "cometbft_vote_monitor=debug"
    #[serde(default)]
    pub level: Option<String>,
}

// Default values
fn default_timeout() -> u64 {
    10000
}

fn default_validators_per_page() -> u32 {
    100
}

fn default_staking_page_limit() -> u64 {
    100
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_fast_poll_interval() -> u64 {
    250
}

fn default_bootstrap_height() -> u64 {
    10
}

fn default_refresh_every_blocks() -> u64 {
    100
}

fn default_frame_interval() -> u64 {
    100
}

fn default_theme() -> String {
    "dark".to_string()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
            validators_per_page: default_validators_per_page(),
            staking_page_limit: default_staking_page_limit(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            fast_interval_ms: default_fast_poll_interval(),
            bootstrap_height: default_bootstrap_height(),
            refresh_every_blocks: default_refresh_every_blocks(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self, fast: bool) -> Duration {
        if fast {
            Duration::from_millis(self.fast_interval_ms)
        } else {
            Duration::from_millis(self.interval_ms)
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            theme: default_theme(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults
    /// Priority: Environment variables > Config file > Defaults
    ///
    /// Runs before logging is set up, so the chosen file is returned for the
    /// caller to report.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let (mut config, source) = match explicit {
            Some(path) => (Self::read_file(path)?, Some(path.to_path_buf())),
            None => match Self::load_from_file()? {
                Some((config, path)) => (config, Some(path)),
                None => (Config::default(), None),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok((config, source))
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from file (searches multiple locations)
    fn load_from_file() -> Result<Option<(Self, PathBuf)>> {
        for path in Self::config_file_paths() {
            if path.exists() {
                let config = Self::read_file(&path)?;
                return Ok(Some((config, path)));
            }
        }

        Ok(None)
    }

    /// Get list of config file paths to search (in order of priority)
    pub fn config_file_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./cvm.toml")];

        // User config directory (~/.config/cvm/config.toml)
        if let Some(proj_dirs) = ProjectDirs::from("com", "cometbft", "cvm") {
            paths.push(proj_dirs.config_dir().join("config.toml"));
        }

        paths
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Some(timeout) = env_parse("CVM_TIMEOUT_MS") {
            self.rpc.timeout_ms = timeout;
        }
        if let Some(interval) = env_parse("CVM_POLL_INTERVAL_MS") {
            self.poll.interval_ms = interval;
        }
        if let Some(blocks) = env_parse("CVM_REFRESH_EVERY_BLOCKS") {
            self.poll.refresh_every_blocks = blocks;
        }
        if let Ok(theme) = std::env::var("CVM_THEME") {
            self.view.theme = theme;
        }
        if let Ok(file) = std::env::var("CVM_LOG_FILE") {
            self.log.file = Some(file);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("RPC timeout must be greater than 0");
        }
        if self.rpc.validators_per_page == 0 || self.rpc.staking_page_limit == 0 {
            anyhow::bail!("Page sizes must be greater than 0");
        }
        if self.poll.interval_ms == 0 || self.poll.fast_interval_ms == 0 {
            anyhow::bail!("Poll intervals must be greater than 0");
        }
        if self.poll.refresh_every_blocks == 0 {
            anyhow::bail!("refresh_every_blocks must be greater than 0");
        }
        if self.view.frame_interval_ms == 0 {
            anyhow::bail!("Frame interval must be greater than 0");
        }
        if crate::tui::Theme::from_name(&self.view.theme).is_none() {
            anyhow::bail!("Unknown theme {:?} (expected \"dark\" or \"light\")", self.view.theme);
        }

        Ok(())
    }

    pub fn registry_options(&self) -> crate::cosmos::RegistryOptions {
        crate::cosmos::RegistryOptions {
            validators_per_page: self.rpc.validators_per_page,
            staking_page_limit: self.rpc.staking_page_limit,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll.interval(false), Duration::from_secs(1));
        assert_eq!(config.poll.interval(true), Duration::from_millis(250));
        assert_eq!(config.rpc.validators_per_page, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [poll]
            refresh_every_blocks = 50

            [view]
            theme = "light"
            "#,
        )
        .unwrap();
        assert_eq!(config.poll.refresh_every_blocks, 50);
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.view.theme, "light");
        assert_eq!(config.rpc.timeout_ms, 10000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.view.theme = "solarized".to_string();
        assert!(config.validate().is_err());
    }
}
