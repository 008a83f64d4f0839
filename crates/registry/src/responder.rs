//! Request/reply boundary of the registry.
//!
//! Subscribes to the register and unregister subjects, feeds decoded
//! requests into the [`Reconciler`] and answers every request with either
//! the ok token or an `error: <cause>` string. Malformed payloads are
//! rejected with an error reply instead of being processed with empty
//! fields.

use std::sync::Arc;

use futures::StreamExt;
use leafside_common::api::{
    error_reply, CredentialsMessage, OK_RESPONSE, REGISTER_SUBJECT, UNREGISTER_SUBJECT,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::RegistrySettings;
use crate::engine::Reconciler;
use crate::error::{RegistryError, Result};

/// Connects to the NATS server the registry listens on.
pub async fn connect(settings: &RegistrySettings) -> Result<async_nats::Client> {
    async_nats::connect(&settings.nats_uri)
        .await
        .map_err(|e| RegistryError::Connection(e.to_string()))
}

/// Computes the reply for a register request payload.
pub async fn register_reply(engine: &Reconciler, payload: &[u8]) -> String {
    let msg: CredentialsMessage = match serde_json::from_slice(payload) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "malformed register payload");
            return error_reply(&RegistryError::MalformedMessage(e.to_string()));
        }
    };
    match engine.register(&msg).await {
        Ok(()) => OK_RESPONSE.to_string(),
        Err(e) => {
            warn!(network = %msg.network, component = %msg.component, error = %e, "register failed");
            error_reply(&e)
        }
    }
}

/// Computes the reply for an unregister request payload.
pub async fn unregister_reply(engine: &Reconciler, payload: &[u8]) -> String {
    let msg: CredentialsMessage = match serde_json::from_slice(payload) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "malformed unregister payload");
            return error_reply(&RegistryError::MalformedMessage(e.to_string()));
        }
    };
    match engine.unregister(&msg.network, &msg.component).await {
        Ok(()) => OK_RESPONSE.to_string(),
        Err(e) => {
            warn!(network = %msg.network, component = %msg.component, error = %e, "unregister failed");
            error_reply(&e)
        }
    }
}

/// Serves register/unregister requests until shutdown is signalled.
pub struct RequestResponder {
    client: async_nats::Client,
    engine: Arc<Reconciler>,
}

impl RequestResponder {
    pub fn new(client: async_nats::Client, engine: Arc<Reconciler>) -> Self {
        Self { client, engine }
    }

    /// Runs the subscription loop.
    ///
    /// On shutdown the subscriptions are closed first, in-flight requests
    /// finish, then pending replies are flushed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut register_sub = self
            .client
            .subscribe(REGISTER_SUBJECT)
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;
        let mut unregister_sub = self
            .client
            .subscribe(UNREGISTER_SUBJECT)
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;
        info!(
            register = REGISTER_SUBJECT,
            unregister = UNREGISTER_SUBJECT,
            "registry listening"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("responder shutting down");
                    break;
                }
                Some(msg) = register_sub.next() => {
                    let reply = register_reply(&self.engine, &msg.payload).await;
                    self.send_reply(msg.reply.as_deref(), reply).await;
                }
                Some(msg) = unregister_sub.next() => {
                    let reply = unregister_reply(&self.engine, &msg.payload).await;
                    self.send_reply(msg.reply.as_deref(), reply).await;
                }
            }
        }

        if let Err(e) = register_sub.unsubscribe().await {
            warn!(error = %e, "failed to unsubscribe register subject");
        }
        if let Err(e) = unregister_sub.unsubscribe().await {
            warn!(error = %e, "failed to unsubscribe unregister subject");
        }
        if let Err(e) = self.client.flush().await {
            warn!(error = %e, "failed to flush pending replies");
        }
        Ok(())
    }

    async fn send_reply(&self, reply_subject: Option<&str>, reply: String) {
        let Some(subject) = reply_subject else {
            debug!("request carried no reply subject");
            return;
        };
        if let Err(e) = self
            .client
            .publish(subject.to_string(), reply.into())
            .await
        {
            warn!(subject, error = %e, "failed to publish reply");
        }
    }
}
