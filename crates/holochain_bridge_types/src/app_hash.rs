//! The identity of an app instance taking part in a bridge.

use crate::error::BridgeTypesError;
use std::str::FromStr;

/// Content-derived identity of an app, in its printable (base58 multihash) form.
///
/// The bridge never computes these itself; it receives them from whoever
/// resolved the other side of the bridge and only compares and stores them.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
    shrinkwraprs::Shrinkwrap,
)]
#[serde(transparent)]
pub struct AppHash(String);

impl AppHash {
    /// Build from a string that was already validated elsewhere, e.g. read
    /// back from the database.
    pub fn from_raw(s: String) -> Self {
        Self(s)
    }

    /// The printable form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AppHash {
    type Err = BridgeTypesError;

    /// Accepts the printable form exactly as given. Input containing
    /// whitespace, including leading or trailing padding, is refused.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(BridgeTypesError::EmptyAppHash);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(BridgeTypesError::MalformedAppHash(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}
