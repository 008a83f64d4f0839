//! Draining of a tenant's JetStream streams before teardown.
//!
//! Before a network's leaf connection is removed, the streams living in its
//! JetStream domain are deleted with the tenant's own credentials. The poll
//! loop is bounded; exhausting it yields [`RegistryError::DrainTimeout`],
//! which the engine treats according to its teardown policy.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};

/// Default wait between drain rounds.
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(1);
/// Default number of drain rounds before giving up.
pub const DEFAULT_DRAIN_MAX_ATTEMPTS: u32 = 60;

/// Deletes the streams belonging to a tenant's domain.
///
/// The engine only depends on this trait; tests substitute their own
/// implementation.
#[async_trait]
pub trait StreamDrainer: Send + Sync {
    /// Blocks until the domain holds no streams or the bound is exhausted.
    async fn drain(&self, address: &str, creds: &str, domain: &str) -> Result<()>;
}

/// [`StreamDrainer`] backed by a JetStream connection per drain call.
#[derive(Debug, Clone)]
pub struct JetStreamDrainer {
    interval: Duration,
    max_attempts: u32,
}

impl Default for JetStreamDrainer {
    fn default() -> Self {
        Self {
            interval: DEFAULT_DRAIN_INTERVAL,
            max_attempts: DEFAULT_DRAIN_MAX_ATTEMPTS,
        }
    }
}

impl JetStreamDrainer {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Lists the names of all streams in the domain.
    async fn stream_names(context: &async_nats::jetstream::Context) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut stream = context.stream_names();
        while let Some(name) = stream
            .try_next()
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?
        {
            names.push(name);
        }
        Ok(names)
    }
}

#[async_trait]
impl StreamDrainer for JetStreamDrainer {
    async fn drain(&self, address: &str, creds: &str, domain: &str) -> Result<()> {
        let client = async_nats::ConnectOptions::with_credentials(creds)
            .map_err(|e| RegistryError::Connection(e.to_string()))?
            .connect(address)
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;
        let context = async_nats::jetstream::with_domain(client, domain);

        for attempt in 1..=self.max_attempts {
            let names = Self::stream_names(&context).await?;
            if names.is_empty() {
                info!(domain, attempt, "domain drained, no streams left");
                return Ok(());
            }
            debug!(domain, attempt, remaining = names.len(), "draining domain");
            for name in &names {
                if let Err(e) = context.delete_stream(name).await {
                    warn!(domain, stream = %name, error = %e, "failed to delete stream");
                }
            }
            tokio::time::sleep(self.interval).await;
        }

        Err(RegistryError::DrainTimeout {
            domain: domain.to_string(),
            attempts: self.max_attempts,
        })
    }
}
