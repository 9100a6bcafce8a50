//! Agent configuration loaded from `FLEET_AGENT_*` environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "FLEET_AGENT_";

pub const AGENT_STORE_FILE: &str = "agent.keystore";
pub const TRUST_STORE_FILE: &str = "trust.keystore";
pub const GUID_FILE: &str = "guid.txt";
pub const AUTOREGISTER_FILE: &str = "autoregister.properties";

/// Agent configuration.
///
/// Each field maps to `FLEET_AGENT_<FIELD>`:
///   - `FLEET_AGENT_SERVER_URL`           (required)
///   - `FLEET_AGENT_REGISTRATION_PATH`    (default `/admin/agent`)
///   - `FLEET_AGENT_CONFIG_DIR`           (default `config`)
///   - `FLEET_AGENT_STORE_PASSWORD`       (required)
///   - `FLEET_AGENT_TRUST_STORE_PASSWORD` (defaults to the store password)
///   - `FLEET_AGENT_RETRY_INTERVAL_SECS`  (default 5)
///   - `FLEET_AGENT_CONNECT_TIMEOUT_SECS` (default 10)
///   - `FLEET_AGENT_READ_TIMEOUT_SECS`    (default 30)
#[derive(Deserialize)]
pub struct AgentConfig {
    pub server_url: String,

    #[serde(default = "default_registration_path")]
    pub registration_path: String,

    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    store_password: String,

    #[serde(default)]
    trust_store_password: Option<String>,

    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_registration_path() -> String {
    "/admin/agent".to_string()
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_retry_interval_secs() -> u64 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    30
}

impl AgentConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self> {
        envy::prefixed(ENV_PREFIX).from_env::<Self>().context(
            "failed to load config from FLEET_AGENT_* env vars \
             (FLEET_AGENT_SERVER_URL and FLEET_AGENT_STORE_PASSWORD are required)",
        )
    }

    /// Load from explicit `(name, value)` pairs, names carrying the prefix.
    ///
    /// # Errors
    ///
    /// Same as [`AgentConfig::from_env`].
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Self>(vars)
            .context("failed to load config from FLEET_AGENT_* variables")
    }

    /// Full agent registration URL on the coordinator.
    #[must_use]
    pub fn registration_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let path = self.registration_path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    #[must_use]
    pub fn agent_store_path(&self) -> PathBuf {
        self.config_dir.join(AGENT_STORE_FILE)
    }

    #[must_use]
    pub fn trust_store_path(&self) -> PathBuf {
        self.config_dir.join(TRUST_STORE_FILE)
    }

    #[must_use]
    pub fn guid_path(&self) -> PathBuf {
        self.config_dir.join(GUID_FILE)
    }

    #[must_use]
    pub fn autoregister_path(&self) -> PathBuf {
        self.config_dir.join(AUTOREGISTER_FILE)
    }

    #[must_use]
    pub fn store_password(&self) -> &str {
        &self.store_password
    }

    #[must_use]
    pub fn trust_store_password(&self) -> &str {
        self.trust_store_password
            .as_deref()
            .unwrap_or(&self.store_password)
    }

    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("server_url", &self.server_url)
            .field("registration_path", &self.registration_path)
            .field("config_dir", &self.config_dir)
            .field("retry_interval_secs", &self.retry_interval_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish_non_exhaustive()
    }
}
