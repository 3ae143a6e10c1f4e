use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PagesentryError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fetch and scheduling settings
    pub monitoring: MonitoringConfig,

    /// HTTP trigger surface settings
    pub server: ServerConfig,

    /// Target persistence settings
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Per-fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with every fetch; some sites reject
    /// default client identifiers, so this defaults to a browser string
    pub user_agent: String,

    /// Local wall-clock hour at which the daily sweep fires
    pub schedule_hour: u32,

    /// Local wall-clock minute at which the daily sweep fires
    pub schedule_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the trigger surface binds to
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON target store
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitoring: MonitoringConfig {
                fetch_timeout_secs: 10,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
                schedule_hour: 3,
                schedule_minute: 0,
            },
            server: ServerConfig {
                bind_addr: "127.0.0.1:8900".to_string(),
            },
            store: StoreConfig {
                path: PathBuf::from("targets.json"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PagesentryError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PagesentryError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Pagesentry.toml",
                    "pagesentry.toml",
                    ".pagesentry.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
