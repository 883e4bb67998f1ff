//! ecsctl.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "ecsctl.toml";

/// Shortest pause allowed between poll cycles.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsctlConfig {
    pub wait: WaitConfig,
    pub aws: AwsConfig,
}

/// Rollout-wait tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Give up once this many seconds have passed since waiting started.
    pub timeout_secs: u64,
    /// Pause between poll cycles.
    pub poll_interval_secs: u64,
    /// Tasks younger than this are not considered settled.
    pub min_task_age_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            poll_interval_secs: 60,
            min_task_age_secs: 60,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Never shorter than [`MIN_POLL_INTERVAL_SECS`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region override; falls back to the standard AWS provider chain.
    pub region: Option<String>,
    /// Named profile from the shared AWS config files.
    pub profile: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid {path}: {message}")]
    Invalid { path: String, message: String },
}

impl EcsctlConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        if config.wait.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(ConfigError::Invalid {
                path: path.display().to_string(),
                message: format!(
                    "wait.poll_interval_secs must be at least {MIN_POLL_INTERVAL_SECS}"
                ),
            });
        }
        Ok(config)
    }

    /// Load `path` if given, else `./ecsctl.toml` if it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
