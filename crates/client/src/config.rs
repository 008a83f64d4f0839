//! Configuration for the sidecar client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Sidecar client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// NATS server the registry listens on.
    #[serde(default = "default_nats_uri")]
    pub nats_uri: String,

    /// Name of the component this sidecar is attached to.
    pub component: String,

    /// Path of the component's credentials file, conventionally
    /// `{network}.creds`.
    pub creds_file: PathBuf,

    /// Logical network to join. Defaults to the creds file basename.
    #[serde(default)]
    pub network: Option<String>,

    /// Upstream address the leaf-node remote for the network connects to.
    pub remote_address: String,

    /// Public key of the network account, if known.
    #[serde(default)]
    pub account_public_key: Option<String>,

    /// Timeout for register/unregister requests (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Default timeout for register/unregister requests (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_nats_uri() -> String {
    "nats://leaf-nats.nats:4222".to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.component.is_empty() {
            return Err(ClientError::Config("component cannot be empty".to_string()));
        }
        if self.remote_address.is_empty() {
            return Err(ClientError::Config(
                "remote_address cannot be empty".to_string(),
            ));
        }
        if self.network().is_none() {
            return Err(ClientError::Config(format!(
                "cannot derive network from creds file '{}'",
                self.creds_file.display()
            )));
        }
        Ok(())
    }

    /// Network to join: the explicit setting, or the creds file basename
    /// stripped of its `.creds` extension.
    pub fn network(&self) -> Option<String> {
        if let Some(network) = &self.network {
            if !network.is_empty() {
                return Some(network.clone());
            }
        }
        network_from_creds_path(&self.creds_file)
    }

    /// Request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn network_from_creds_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let network = name.strip_suffix(".creds")?;
    if network.is_empty() {
        None
    } else {
        Some(network.to_string())
    }
}
