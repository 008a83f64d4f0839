//! Client half of the leafside sidecar pair.
//!
//! Runs next to an application component, announces its participation in a
//! network when it starts and retracts it on shutdown. The heavy lifting
//! (config reconciliation, creds bookkeeping) happens in the registry; the
//! client only carries the component's credentials over the bus.

pub mod config;
pub mod error;

use leafside_common::api::{
    CredentialsMessage, OK_RESPONSE, REGISTER_SUBJECT, UNREGISTER_SUBJECT,
};
use leafside_common::creds::parse_creds;
use tracing::{info, warn};

pub use config::ClientConfig;
pub use error::{ClientError, Result};

/// Client for the registry service.
pub struct RegistryClient {
    nc: async_nats::Client,
    config: ClientConfig,
    message: CredentialsMessage,
}

impl RegistryClient {
    /// Reads the component's credentials and prepares the wire message.
    ///
    /// The NATS connection is established by the caller; reconnect handling
    /// lives outside this crate.
    pub fn new(nc: async_nats::Client, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let network = config
            .network()
            .ok_or_else(|| ClientError::Config("network not derivable".to_string()))?;

        let creds = std::fs::read_to_string(&config.creds_file)?;
        if parse_creds(&creds).is_err() {
            warn!(
                path = %config.creds_file.display(),
                "creds file does not look like a NATS creds file"
            );
        }

        let message = CredentialsMessage {
            nats_address: config.remote_address.clone(),
            network,
            component: config.component.clone(),
            creds,
            account_public_key: config.account_public_key.clone().unwrap_or_default(),
        };
        Ok(Self {
            nc,
            config,
            message,
        })
    }

    /// Announces participation to the registry.
    pub async fn register(&self) -> Result<()> {
        info!(
            network = %self.message.network,
            component = %self.message.component,
            "registering with registry"
        );
        self.request(REGISTER_SUBJECT).await
    }

    /// Retracts participation from the registry.
    pub async fn unregister(&self) -> Result<()> {
        info!(
            network = %self.message.network,
            component = %self.message.component,
            "unregistering from registry"
        );
        self.request(UNREGISTER_SUBJECT).await
    }

    async fn request(&self, subject: &'static str) -> Result<()> {
        let payload = serde_json::to_vec(&self.message)?;
        let response = tokio::time::timeout(
            self.config.request_timeout(),
            self.nc.request(subject, payload.into()),
        )
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|e| ClientError::Connection(e.to_string()))?;

        let reply = String::from_utf8_lossy(&response.payload);
        if reply != OK_RESPONSE {
            return Err(ClientError::Rejected(reply.into_owned()));
        }
        Ok(())
    }
}
