//! Wire contract between client and registry.

use serde::{Deserialize, Serialize};

/// Subject used to announce participation in a network.
pub const REGISTER_SUBJECT: &str = "register";
/// Subject used to retract participation from a network.
pub const UNREGISTER_SUBJECT: &str = "unregister";
/// Reply sent when a request was handled successfully.
pub const OK_RESPONSE: &str = "ok";
/// Prefix of a reply carrying a failure cause.
pub const ERROR_PREFIX: &str = "error: ";

/// Request payload carried on both the register and unregister subjects.
///
/// Unregister requests only consult `network` and `component`; the remaining
/// fields may be empty there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsMessage {
    /// Address of the upstream NATS server the leaf-node remote connects to.
    #[serde(rename = "natsAddress", default)]
    pub nats_address: String,
    /// Logical network (tenant) the component participates in.
    #[serde(default)]
    pub network: String,
    /// Identifier of the participating component.
    #[serde(default)]
    pub component: String,
    /// Raw credentials blob for the network account.
    #[serde(default)]
    pub creds: String,
    /// Public key of the network account.
    #[serde(rename = "accountPublicKey", default)]
    pub account_public_key: String,
}

impl CredentialsMessage {
    /// Conventional basename of the credentials file for a network.
    pub fn creds_file_name(network: &str) -> String {
        format!("{network}.creds")
    }
}

/// Builds the reply string for a failed request.
pub fn error_reply(cause: &impl std::fmt::Display) -> String {
    format!("{ERROR_PREFIX}{cause}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roundtrip() {
        let msg = CredentialsMessage {
            nats_address: "nats://nats.nats:4222".to_string(),
            network: "netA".to_string(),
            component: "compX".to_string(),
            creds: "blob".to_string(),
            account_public_key: "AABBCC".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"natsAddress\""));
        assert!(json.contains("\"accountPublicKey\""));
        let back: CredentialsMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let msg: CredentialsMessage =
            serde_json::from_str(r#"{"network":"netB","component":"compZ"}"#).unwrap();
        assert_eq!(msg.network, "netB");
        assert_eq!(msg.component, "compZ");
        assert!(msg.creds.is_empty());
        assert!(msg.nats_address.is_empty());
    }

    #[test]
    fn test_error_reply_format() {
        let reply = error_reply(&"network foo not found");
        assert_eq!(reply, "error: network foo not found");
    }
}
