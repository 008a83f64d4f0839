//! Parsing and rendering of NATS `.creds` blobs.
//!
//! A creds file carries a user JWT and an NKEY seed between armor lines.
//! The registry uses [`parse_creds`] as a sanity check on incoming blobs;
//! [`render_creds`] builds a blob from its parts.

use thiserror::Error;

const JWT_MARKER: &str = "BEGIN NATS USER JWT";
const NKEY_MARKER: &str = "BEGIN USER NKEY SEED";

const CREDS_TEMPLATE: &str = r#"-----BEGIN NATS USER JWT-----
ENTER-JWT-HERE
------END NATS USER JWT------

************************* IMPORTANT *************************
NKEY Seed printed below can be used to sign and prove identity.
NKEYs are sensitive and should be treated as secrets.

-----BEGIN USER NKEY SEED-----
ENTER-NKEY-HERE
------END USER NKEY SEED------

*************************************************************
"#;

/// Error raised for creds blobs that do not carry both a JWT and an NKEY.
#[derive(Debug, Error)]
#[error("creds blob does not contain both a JWT and an NKEY seed")]
pub struct CredsError;

/// JWT and NKEY seed extracted from a creds blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCreds {
    pub jwt: String,
    pub nkey_seed: String,
}

/// Extracts the user JWT and NKEY seed from a creds blob.
pub fn parse_creds(creds: &str) -> Result<ParsedCreds, CredsError> {
    let mut jwt = String::new();
    let mut nkey = String::new();
    let lines: Vec<&str> = creds.lines().collect();
    for window in lines.windows(2) {
        if window[0].contains(JWT_MARKER) {
            jwt = window[1].trim().to_string();
        } else if window[0].contains(NKEY_MARKER) {
            nkey = window[1].trim().to_string();
        }
    }
    if jwt.is_empty() || nkey.is_empty() {
        return Err(CredsError);
    }
    Ok(ParsedCreds {
        jwt,
        nkey_seed: nkey,
    })
}

/// Renders a creds blob from a user JWT and an NKEY seed.
pub fn render_creds(jwt: &str, nkey_seed: &str) -> String {
    CREDS_TEMPLATE
        .replace("ENTER-JWT-HERE", jwt)
        .replace("ENTER-NKEY-HERE", nkey_seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_and_parse_roundtrip() {
        let blob = render_creds("eyJhbGciOiJlZDI1NTE5In0.payload.sig", "SUAABCDEF");
        let parsed = parse_creds(&blob).unwrap();
        assert_eq!(parsed.jwt, "eyJhbGciOiJlZDI1NTE5In0.payload.sig");
        assert_eq!(parsed.nkey_seed, "SUAABCDEF");
    }

    #[test]
    fn test_parse_rejects_incomplete_blob() {
        let blob = "-----BEGIN NATS USER JWT-----\neyJ0\n------END NATS USER JWT------\n";
        assert!(parse_creds(blob).is_err());
        assert!(parse_creds("").is_err());
    }
}
