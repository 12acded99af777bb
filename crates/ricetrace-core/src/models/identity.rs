//! Caller identity model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a caller, as resolved by the (external)
/// authentication layer. Typically a wallet address.
///
/// The registry compares identities byte-for-byte and assigns no meaning
/// to their contents. "No identity" is modelled as `Option<Identity>`,
/// never as a magic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
