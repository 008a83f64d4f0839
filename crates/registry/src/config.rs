//! Configuration for the registry sidecar.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Registry sidecar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// NATS server the registry listens on for register/unregister requests.
    #[serde(default = "default_nats_uri")]
    pub nats_uri: String,

    /// Directory holding one creds file per network.
    #[serde(default = "default_creds_dir")]
    pub creds_dir: PathBuf,

    /// Path of the broker configuration file the registry reconciles.
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,

    /// Path of the usage-state file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Wait between drain rounds (seconds).
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,

    /// Number of drain rounds before giving up.
    #[serde(default = "default_drain_max_attempts")]
    pub drain_max_attempts: u32,

    /// When true, a drain failure blocks teardown of the network instead of
    /// being logged and ignored.
    #[serde(default)]
    pub block_teardown_on_drain_failure: bool,

    /// When true, the broker is signalled (SIGHUP via its pid file) after
    /// every config rewrite.
    #[serde(default = "default_signal_broker_reload")]
    pub signal_broker_reload: bool,
}

fn default_nats_uri() -> String {
    "nats://nats.nats:4222".to_string()
}

fn default_creds_dir() -> PathBuf {
    PathBuf::from("/creds")
}

fn default_config_file() -> PathBuf {
    PathBuf::from("/nats.json")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("/state.json")
}

fn default_drain_interval_secs() -> u64 {
    1
}

fn default_drain_max_attempts() -> u32 {
    60
}

fn default_signal_broker_reload() -> bool {
    true
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            nats_uri: default_nats_uri(),
            creds_dir: default_creds_dir(),
            config_file: default_config_file(),
            state_file: default_state_file(),
            drain_interval_secs: default_drain_interval_secs(),
            drain_max_attempts: default_drain_max_attempts(),
            block_teardown_on_drain_failure: false,
            signal_broker_reload: default_signal_broker_reload(),
        }
    }
}

impl RegistrySettings {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.nats_uri.is_empty() {
            return Err(RegistryError::Config("nats_uri cannot be empty".to_string()));
        }
        if !self.nats_uri.starts_with("nats://") && !self.nats_uri.starts_with("tls://") {
            return Err(RegistryError::Config(
                "nats_uri must start with nats:// or tls://".to_string(),
            ));
        }
        if self.drain_max_attempts == 0 {
            return Err(RegistryError::Config(
                "drain_max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Wait between drain rounds.
    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs)
    }

    /// Path of the creds file for a network.
    pub fn creds_path(&self, network: &str) -> PathBuf {
        self.creds_dir.join(format!("{network}.creds"))
    }
}
