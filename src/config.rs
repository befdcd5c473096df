//! Server configuration parameters
//!
//! All tunable parameters for the railyard service. Defaults match a Pi
//! with the service started from its install directory; a JSON file named
//! by `RAILYARD_CONFIG` overrides any subset of fields.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::drivers::SwitchSettings;

/// Env var naming the JSON config file.
pub const CONFIG_ENV: &str = "RAILYARD_CONFIG";

/// Core service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    // --- HTTP ---
    /// Address to bind; 0.0.0.0 makes the page visible on the LAN
    pub host: String,
    pub port: u16,

    // --- Files ---
    /// Refuse to start unless the process runs from this directory
    pub working_directory: Option<PathBuf>,
    /// Truncated at startup, shown on /log/
    pub log_file: PathBuf,
    /// One JSON file per saved layout
    pub layouts_dir: PathBuf,
    /// Load the `default` layout at startup if it exists
    pub autoload: bool,

    // --- Hardware ---
    pub switches: SwitchSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,

            working_directory: None,
            log_file: PathBuf::from("server.log"),
            layouts_dir: PathBuf::from("layouts"),
            autoload: true,

            switches: SwitchSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `RAILYARD_CONFIG` if set, otherwise defaults.
    pub fn from_env() -> Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        if self.host.trim().is_empty() {
            bail!("host must not be empty");
        }
        if let Err(msg) = self.switches.validate() {
            bail!("{msg}");
        }
        Ok(())
    }

    /// Fail unless the process runs from [`Self::working_directory`].
    ///
    /// Relative log and layout paths resolve against the working directory,
    /// so a service started elsewhere would scatter files.
    pub fn check_working_directory(&self) -> Result<()> {
        let Some(expected) = &self.working_directory else {
            return Ok(());
        };
        let cwd = env::current_dir().context("reading current directory")?;
        if &cwd != expected {
            bail!(
                "expected current working directory {}, found {}",
                expected.display(),
                cwd.display()
            );
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
