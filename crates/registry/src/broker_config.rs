//! In-memory model of the broker's JSON configuration file.
//!
//! The broker process treats this file as read-only input it reloads from
//! disk; the registry is its only writer. Fields the registry does not
//! manage (accounts, resolver preload, server name, ...) are kept in a
//! flattened pass-through map so they survive every rewrite unchanged.
//!
//! Remote entries are keyed by the credentials-file basename: the entry for
//! network `foo` is the one whose credentials path ends in `foo.creds`.
//! This is the canonical matching rule for both add and remove.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{RegistryError, Result};

/// Default monitoring port of the broker, used for the minimal config.
const DEFAULT_HTTP_PORT: u16 = 8222;

/// One leaf-node remote connection bridging traffic for a single network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Upstream url, e.g. `tls://connect.ngs.global:7422` or `nats://localhost:4222`.
    pub url: String,
    /// Path to the creds file for the network account.
    pub credentials: String,
    /// Public key of the network account.
    #[serde(default)]
    pub account: String,
    /// Subjects the remote must not import.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny_imports: Vec<String>,
    /// Subjects the remote must not export.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny_exports: Vec<String>,
}

impl RemoteEntry {
    /// True when this entry belongs to `network` (credentials basename rule).
    fn matches_network(&self, network: &str) -> bool {
        Path::new(&self.credentials)
            .file_name()
            .map(|name| name == format!("{network}.creds").as_str())
            .unwrap_or(false)
    }
}

/// Leafnode section of the broker configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leafnodes {
    #[serde(default)]
    pub remotes: Vec<RemoteEntry>,
}

/// JetStream section of the broker configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jetstream {
    pub store_dir: String,
    pub domain: String,
}

/// Account resolver section of the broker configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolver {
    #[serde(rename = "type")]
    pub resolver_type: String,
    pub dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    pub timeout: String,
}

/// Full broker configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jetstream: Option<Jetstream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_file: Option<String>,
    pub http: u16,
    #[serde(default)]
    pub leafnodes: Leafnodes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<Resolver>,
    /// Everything the registry does not manage (accounts, authorization,
    /// resolver_preload, server_name, ...) passes through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            jetstream: None,
            pid_file: None,
            http: DEFAULT_HTTP_PORT,
            leafnodes: Leafnodes::default(),
            operator: None,
            system_account: None,
            resolver: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl BrokerConfig {
    /// Loads the configuration from `path`.
    ///
    /// A missing or unparseable file yields the minimal default document;
    /// the surrounding broker expects a config file to always exist.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file not readable, starting from default");
                Self::default()
            }
        }
    }

    /// Parses a configuration from JSON text, falling back to the default
    /// document when the text is not valid JSON.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "config file not parseable, starting from default");
                Self::default()
            }
        }
    }

    /// Serializes the document to canonical pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Returns the remote entry for `network`, if present.
    pub fn remote(&self, network: &str) -> Option<&RemoteEntry> {
        self.leafnodes
            .remotes
            .iter()
            .find(|r| r.matches_network(network))
    }

    /// True when a remote entry for `network` exists.
    pub fn has_remote(&self, network: &str) -> bool {
        self.remote(network).is_some()
    }

    /// Appends a remote entry for `network` unless one already exists.
    ///
    /// Repeated adds for the same network are no-ops; at most one entry per
    /// network can exist.
    pub fn add_remote(
        &mut self,
        network: &str,
        url: &str,
        credentials_path: &str,
        account_public_key: &str,
        deny_imports: Vec<String>,
        deny_exports: Vec<String>,
    ) {
        if self.has_remote(network) {
            return;
        }
        self.leafnodes.remotes.push(RemoteEntry {
            url: url.to_string(),
            credentials: credentials_path.to_string(),
            account: account_public_key.to_string(),
            deny_imports,
            deny_exports,
        });
    }

    /// Removes the remote entry for `network`.
    pub fn remove_remote(&mut self, network: &str) -> Result<()> {
        let before = self.leafnodes.remotes.len();
        self.leafnodes
            .remotes
            .retain(|r| !r.matches_network(network));
        if self.leafnodes.remotes.len() == before {
            return Err(RegistryError::RemoteNotFound(network.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document() {
        let config = BrokerConfig::default();
        assert_eq!(config.http, 8222);
        assert!(config.leafnodes.remotes.is_empty());
    }

    #[test]
    fn test_from_json_invalid_falls_back_to_default() {
        let config = BrokerConfig::from_json("this is not json");
        assert_eq!(config, BrokerConfig::default());
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let config = BrokerConfig::load("/this/path/does/not/exist");
        assert_eq!(config, BrokerConfig::default());
    }

    #[test]
    fn test_add_remote_is_idempotent() {
        let mut config = BrokerConfig::default();
        config.add_remote(
            "netA",
            "tls://connect.ngs.global:7422",
            "/creds/netA.creds",
            "AABBCC",
            vec![],
            vec![],
        );
        config.add_remote(
            "netA",
            "tls://somewhere.else:7422",
            "/creds/netA.creds",
            "DDEEFF",
            vec![],
            vec![],
        );
        assert_eq!(config.leafnodes.remotes.len(), 1);
        assert_eq!(config.remote("netA").unwrap().account, "AABBCC");
    }

    #[test]
    fn test_remove_remote() {
        let mut config = BrokerConfig::default();
        config.add_remote(
            "netA",
            "nats://localhost:4222",
            "/creds/netA.creds",
            "AABBCC",
            vec![],
            vec![],
        );
        config.remove_remote("netA").unwrap();
        assert!(!config.has_remote("netA"));
        assert!(matches!(
            config.remove_remote("netA"),
            Err(RegistryError::RemoteNotFound(_))
        ));
    }

    #[test]
    fn test_matching_rule_is_basename_not_substring() {
        let mut config = BrokerConfig::default();
        config.add_remote(
            "net",
            "nats://localhost:4222",
            "/creds/net.creds",
            "A",
            vec![],
            vec![],
        );
        // "net" must not match the remote of "othernet"
        config.add_remote(
            "othernet",
            "nats://localhost:4222",
            "/creds/othernet.creds",
            "B",
            vec![],
            vec![],
        );
        assert_eq!(config.leafnodes.remotes.len(), 2);
        config.remove_remote("net").unwrap();
        assert!(config.has_remote("othernet"));
    }

    #[test]
    fn test_passthrough_fields_survive_roundtrip() {
        let text = r#"{
            "accounts": {
                "netA": { "users": [{ "user": "a", "password": "b" }] }
            },
            "http": 8222,
            "leafnodes": {
                "remotes": [
                    { "url": "nats://localhost:8222", "credentials": "/path/to/creds1.creds" }
                ]
            },
            "pid_file": "/var/run/nats/nats.pid",
            "server_name": "edge"
        }"#;
        let config = BrokerConfig::from_json(text);
        assert_eq!(config.http, 8222);
        assert_eq!(config.pid_file.as_deref(), Some("/var/run/nats/nats.pid"));
        assert_eq!(config.leafnodes.remotes[0].url, "nats://localhost:8222");
        assert!(config.extra.contains_key("accounts"));
        assert_eq!(config.extra["server_name"], "edge");

        let rendered = config.to_json().unwrap();
        let back = BrokerConfig::from_json(&rendered);
        assert_eq!(back, config);
    }

    #[test]
    fn test_serialize_roundtrip_logical_equality() {
        let mut config = BrokerConfig::default();
        config.add_remote(
            "netA",
            "tls://connect.ngs.global:7422",
            "/creds/netA.creds",
            "AABBCC",
            vec!["local.>".to_string()],
            vec![],
        );
        let rendered = config.to_json().unwrap();
        let back = BrokerConfig::from_json(&rendered);
        assert_eq!(back, config);
        // repeated serialization of equal logical content is byte-identical
        assert_eq!(back.to_json().unwrap(), rendered);
    }
}
