//! Registry half of the leafside sidecar pair.
//!
//! Tracks which networks are in use by which components, reconciles the
//! broker's leaf-node configuration file accordingly and serves
//! register/unregister requests over the shared messaging fabric.
//!
//! # Components
//!
//! - [`broker_config::BrokerConfig`]: the broker's JSON config document
//! - [`state::UsageState`]: persistent reference counts per network
//! - [`drain::StreamDrainer`]: JetStream domain teardown
//! - [`engine::Reconciler`]: the single-writer reconciliation engine
//! - [`responder::RequestResponder`]: request/reply boundary

pub mod broker_config;
pub mod config;
pub mod drain;
pub mod engine;
pub mod error;
mod persist;
mod reload;
pub mod responder;
pub mod state;

pub use broker_config::{BrokerConfig, RemoteEntry};
pub use config::RegistrySettings;
pub use drain::{JetStreamDrainer, StreamDrainer};
pub use engine::Reconciler;
pub use error::{RegistryError, Result};
pub use responder::RequestResponder;
pub use state::{UpdateAction, UsageState};
