//! Configuration management module
//!
//! Handles loading, validation, and management of application configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Default network address for the socket endpoint
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Default network port for the socket endpoint
pub const DEFAULT_PORT: u16 = 5555;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Network address used when the command line does not supply one
    pub address: String,

    /// Network port used when the command line does not supply one
    pub port: u16,

    /// Stdin FIFO path
    pub stdin_fifo: Option<String>,

    /// Stdout FIFO path
    pub stdout_fifo: Option<String>,

    /// Open the stdout FIFO before the stdin FIFO
    pub reverse_fifo_open: bool,

    /// Logging level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            stdin_fifo: None,
            stdout_fifo: None,
            reverse_fifo_open: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        // PROCOM_ADDRESS - network address
        if let Ok(address) = env::var("PROCOM_ADDRESS") {
            if !address.trim().is_empty() {
                self.address = address;
            }
        }

        // PROCOM_PORT - network port
        if let Ok(port) = env::var("PROCOM_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                self.port = value;
            }
        }

        // PROCOM_STDIN_FIFO - stdin FIFO path
        if let Ok(path) = env::var("PROCOM_STDIN_FIFO") {
            if !path.trim().is_empty() {
                self.stdin_fifo = Some(path);
            }
        }

        // PROCOM_STDOUT_FIFO - stdout FIFO path
        if let Ok(path) = env::var("PROCOM_STDOUT_FIFO") {
            if !path.trim().is_empty() {
                self.stdout_fifo = Some(path);
            }
        }

        // PROCOM_REVERSE_FIFO_OPEN - FIFO open order
        if let Ok(reverse) = env::var("PROCOM_REVERSE_FIFO_OPEN") {
            self.reverse_fifo_open = reverse.parse().unwrap_or(self.reverse_fifo_open);
        }

        // PROCOM_LOG_LEVEL - logging level
        if let Ok(log_level) = env::var("PROCOM_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|err| {
            tracing::warn!("Failed to load config: {}, using defaults", err);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            anyhow::bail!("Network address must not be empty");
        }

        if self.port == 0 {
            anyhow::bail!("Network port must be greater than 0");
        }

        if let Some(path) = &self.stdin_fifo {
            if path.trim().is_empty() {
                anyhow::bail!("Stdin FIFO path must not be empty");
            }
        }

        if let Some(path) = &self.stdout_fifo {
            if path.trim().is_empty() {
                anyhow::bail!("Stdout FIFO path must not be empty");
            }
        }

        // Two programs attached to a single FIFO in both directions would
        // read back their own lines
        if let (Some(stdin_fifo), Some(stdout_fifo)) = (&self.stdin_fifo, &self.stdout_fifo) {
            if stdin_fifo == stdout_fifo {
                anyhow::bail!("Stdin and stdout FIFOs must be different paths");
            }
        }

        Ok(())
    }

    /// Display formatted configuration
    pub fn display(&self) -> Result<()> {
        println!("Current configuration:");
        println!("{:#?}", self);
        Ok(())
    }
}
