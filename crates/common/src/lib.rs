//! Shared definitions for the leafside sidecar pair.
//!
//! Both halves of the pair speak the same wire contract:
//!
//! - the client announces participation on the [`REGISTER_SUBJECT`] and
//!   retracts it on the [`UNREGISTER_SUBJECT`]
//! - the registry answers every request with either [`OK_RESPONSE`] or an
//!   `error: <cause>` string built by [`error_reply`]
//!
//! The payload of both requests is a [`CredentialsMessage`].

pub mod api;
pub mod creds;

pub use api::{
    error_reply, CredentialsMessage, ERROR_PREFIX, OK_RESPONSE, REGISTER_SUBJECT,
    UNREGISTER_SUBJECT,
};
pub use creds::{parse_creds, render_creds, CredsError, ParsedCreds};
