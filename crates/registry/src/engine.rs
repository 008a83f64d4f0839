//! Reconciliation of register/unregister requests against broker state.
//!
//! Each logical network moves through an implicit lifecycle:
//! absent -> active (first register) -> draining -> absent (last
//! unregister). The engine owns both the broker configuration document and
//! the usage state; every mutating operation runs under a single lock so
//! the existence check and the mutation of a remote entry are one critical
//! section. Concurrent registers for a never-seen network therefore produce
//! exactly one remote entry.
//!
//! Failure policy follows the best-effort model of the sidecar: a failed
//! step is reported to the caller, but the remaining independent steps are
//! still attempted so the on-disk projection stays as close to the desired
//! state as possible. Cleanup-path failures (drain, missing creds file,
//! missing remote entry) are logged and never fail the operation, unless
//! the teardown-blocking drain policy is enabled.

use std::sync::Arc;

use leafside_common::api::CredentialsMessage;
use leafside_common::creds::parse_creds;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::broker_config::BrokerConfig;
use crate::config::RegistrySettings;
use crate::drain::StreamDrainer;
use crate::error::{RegistryError, Result};
use crate::persist::atomic_write;
use crate::reload::signal_broker_reload;
use crate::state::{UpdateAction, UsageState};

/// State owned exclusively by the engine, mutated under one lock.
struct Inner {
    config: BrokerConfig,
    state: UsageState,
}

/// Single-writer reconciliation engine for the leaf-node registry.
pub struct Reconciler {
    settings: RegistrySettings,
    drainer: Arc<dyn StreamDrainer>,
    inner: Mutex<Inner>,
}

impl Reconciler {
    /// Loads broker config and usage state and persists the config so the
    /// file exists from startup on.
    pub fn new(settings: RegistrySettings, drainer: Arc<dyn StreamDrainer>) -> Result<Self> {
        settings.validate()?;
        std::fs::create_dir_all(&settings.creds_dir)?;

        let config = BrokerConfig::load(&settings.config_file);
        let state = UsageState::load(&settings.state_file)?;
        atomic_write(&settings.config_file, config.to_json()?.as_bytes())?;

        Ok(Self {
            settings,
            drainer,
            inner: Mutex::new(Inner { config, state }),
        })
    }

    /// Registers `component` as a participant of `network`.
    ///
    /// Creates the remote entry on first registration, records the
    /// participant, writes the creds file and persists the configuration.
    /// The first failing step is reported; later independent steps are
    /// still attempted.
    pub async fn register(&self, msg: &CredentialsMessage) -> Result<()> {
        validate_keys(&msg.network, &msg.component)?;
        if parse_creds(&msg.creds).is_err() {
            warn!(
                network = %msg.network,
                component = %msg.component,
                "creds blob does not look like a NATS creds file, storing as received"
            );
        }

        let mut inner = self.inner.lock().await;
        let creds_path = self.settings.creds_path(&msg.network);
        let mut first_err: Option<RegistryError> = None;

        if !inner.config.has_remote(&msg.network) {
            inner.config.add_remote(
                &msg.network,
                &msg.nats_address,
                &creds_path.display().to_string(),
                &msg.account_public_key,
                Vec::new(),
                Vec::new(),
            );
            info!(network = %msg.network, "created leaf-node remote");
        }

        if let Err(e) = inner
            .state
            .update(&msg.network, &msg.component, UpdateAction::Add)
        {
            warn!(network = %msg.network, error = %e, "failed to persist usage state");
            first_err.get_or_insert(e);
        }

        if let Err(e) = atomic_write(&creds_path, msg.creds.as_bytes()) {
            warn!(path = %creds_path.display(), error = %e, "failed to write creds file");
            first_err.get_or_insert(e.into());
        }

        self.persist_and_reload(&inner.config, &mut first_err);

        match first_err {
            None => {
                info!(
                    network = %msg.network,
                    component = %msg.component,
                    usage = inner.state.usage(&msg.network).unwrap_or(0),
                    "registered participant"
                );
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    /// Removes `component` from `network` and tears the network down when
    /// it was the last participant.
    ///
    /// Unregistering a never-seen network is tolerated as a no-op.
    pub async fn unregister(&self, network: &str, component: &str) -> Result<()> {
        validate_keys(network, component)?;

        let mut inner = self.inner.lock().await;
        let usage = match inner.state.usage(network) {
            Ok(usage) => usage,
            Err(RegistryError::NetworkNotFound(_)) => {
                info!(network, "unregister for unknown network, nothing to do");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut first_err: Option<RegistryError> = None;
        if usage > 0 {
            if let Err(e) = inner.state.update(network, component, UpdateAction::Remove) {
                warn!(network, error = %e, "failed to persist usage state");
                first_err.get_or_insert(e);
            }
        }

        let remaining = inner.state.usage(network).unwrap_or(0);
        if remaining == 0 {
            if let Err(e) = self.drain_domain(&inner, network).await {
                if self.settings.block_teardown_on_drain_failure {
                    return Err(e);
                }
                warn!(network, error = %e, "drain failed, continuing teardown");
            }

            if let Err(e) = inner.config.remove_remote(network) {
                // not fatal: the entry may never have been created
                warn!(network, error = %e, "no remote entry to remove");
            }

            let creds_path = self.settings.creds_path(network);
            match std::fs::remove_file(&creds_path) {
                Ok(()) => debug!(path = %creds_path.display(), "removed creds file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %creds_path.display(), "creds file already gone");
                }
                Err(e) => warn!(path = %creds_path.display(), error = %e, "failed to remove creds file"),
            }

            if let Err(e) = inner.state.delete(network) {
                warn!(network, error = %e, "failed to delete usage record");
                first_err.get_or_insert(e);
            }
            info!(network, "network torn down");
        }

        self.persist_and_reload(&inner.config, &mut first_err);

        match first_err {
            None => {
                info!(network, component, remaining, "unregistered participant");
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    /// Drains the network's JetStream domain with the tenant's own
    /// credentials, read back from the stored creds file.
    async fn drain_domain(&self, inner: &Inner, network: &str) -> Result<()> {
        let Some(remote) = inner.config.remote(network) else {
            debug!(network, "no remote entry, skipping drain");
            return Ok(());
        };
        if remote.url.is_empty() {
            debug!(network, "remote has no url, skipping drain");
            return Ok(());
        }
        let creds_path = self.settings.creds_path(network);
        let creds = match std::fs::read_to_string(&creds_path) {
            Ok(creds) => creds,
            Err(e) => {
                debug!(network, error = %e, "no creds file, skipping drain");
                return Ok(());
            }
        };
        self.drainer.drain(&remote.url, &creds, network).await
    }

    /// Persists the configuration document and signals the broker; a
    /// persist failure is recorded, a signal failure only logged.
    fn persist_and_reload(&self, config: &BrokerConfig, first_err: &mut Option<RegistryError>) {
        match self.persist_config(config) {
            Ok(()) => {
                if self.settings.signal_broker_reload {
                    signal_broker_reload(config);
                }
            }
            Err(e) => {
                warn!(path = %self.settings.config_file.display(), error = %e, "failed to persist config");
                first_err.get_or_insert(e);
            }
        }
    }

    fn persist_config(&self, config: &BrokerConfig) -> Result<()> {
        let text = config.to_json()?;
        atomic_write(&self.settings.config_file, text.as_bytes())?;
        Ok(())
    }

    /// Current usage count for `network`.
    pub async fn usage(&self, network: &str) -> Result<usize> {
        self.inner.lock().await.state.usage(network)
    }

    /// True when a remote entry for `network` exists.
    pub async fn has_remote(&self, network: &str) -> bool {
        self.inner.lock().await.config.has_remote(network)
    }

    /// Canonical JSON of the current configuration document.
    pub async fn config_json(&self) -> Result<String> {
        self.inner.lock().await.config.to_json()
    }

    /// Settings the engine was constructed with.
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }
}

/// Rejects requests with empty join keys instead of mutating state under
/// empty network/component entries.
fn validate_keys(network: &str, component: &str) -> Result<()> {
    if network.is_empty() {
        return Err(RegistryError::MalformedMessage(
            "network must not be empty".to_string(),
        ));
    }
    if component.is_empty() {
        return Err(RegistryError::MalformedMessage(
            "component must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_keys() {
        assert!(validate_keys("netA", "compX").is_ok());
        assert!(matches!(
            validate_keys("", "compX"),
            Err(RegistryError::MalformedMessage(_))
        ));
        assert!(matches!(
            validate_keys("netA", ""),
            Err(RegistryError::MalformedMessage(_))
        ));
    }
}
