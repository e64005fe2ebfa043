//! Canonical serialization and request signing.
//!
//! The server recomputes `sha256(api_key + json + api_salt)` over the exact
//! `json` string it receives, so the serialization must be byte-stable:
//! object keys sorted at every level, `,` and `:` separators, no whitespace.

use std::fmt::{Debug, Formatter};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::params::ParamMap;

/// API key and salt issued for the account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_salt: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_salt: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_salt: api_salt.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_salt", &"<redacted>")
            .finish()
    }
}

/// Body of one signed call; built per request and consumed by the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub api_key: String,
    pub sign: String,
    pub json: String,
}

impl SignedPayload {
    /// `application/x-www-form-urlencoded` body carrying the three fields.
    pub fn to_form_body(&self) -> String {
        format!(
            "vpbx_api_key={}&sign={}&json={}",
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.sign),
            urlencoding::encode(&self.json)
        )
    }
}

impl Debug for SignedPayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedPayload")
            .field("sign", &self.sign)
            .field("json", &self.json)
            .finish_non_exhaustive()
    }
}

/// Serializes `value` with sorted keys and no incidental whitespace.
///
/// Relies on `serde_json::Map` being a `BTreeMap`; the workspace must not
/// enable serde_json's `preserve_order` feature.
pub fn canonical_json(value: &Value) -> String {
    value.to_string()
}

/// Canonical serialization of a parameter map.
pub fn canonical_params(params: &ParamMap) -> String {
    let object = params
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<Map<String, Value>>();
    canonical_json(&Value::Object(object))
}

/// Hex-encoded `sha256(api_key ∥ canonical ∥ api_salt)`.
pub fn signature(credentials: &Credentials, canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credentials.api_key.as_bytes());
    hasher.update(canonical.as_bytes());
    hasher.update(credentials.api_salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonicalizes and signs `params` for one call.
pub fn sign(params: &ParamMap, credentials: &Credentials) -> SignedPayload {
    let json = canonical_params(params);
    SignedPayload {
        api_key: credentials.api_key.clone(),
        sign: signature(credentials, &json),
        json,
    }
}
