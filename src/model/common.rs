use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Local numeric id of a content item. Differs between environments.
pub type ContentId = i64;

/// Local numeric id of a connection row. Differs between environments.
pub type ConnectionId = i64;

/// Content-derived identity of a connection, stable across environments.
///
/// Two connections with the same type and the same endpoint stable keys
/// always produce the same key, whatever their local ids are.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionKey(String);

impl ConnectionKey {
    /// SHA-256 over `type|from_key|to_key`, hex encoded
    pub fn derive(connection_type: &str, from_key: &str, to_key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(connection_type.as_bytes());
        hasher.update(b"|");
        hasher.update(from_key.as_bytes());
        hasher.update(b"|");
        hasher.update(to_key.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConnectionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConnectionKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a fresh stable key for a newly created content item
pub fn generate_stable_key() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// Derive the callback id an extra is registered under.
///
/// The id must be identical on staging and production, so it is computed
/// from the untranslated extra name only.
pub fn make_callback_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    id
}
