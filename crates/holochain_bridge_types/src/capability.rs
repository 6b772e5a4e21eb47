//! Bearer tokens for bridged calls.

use base64::Engine;
use rand::RngCore;

/// The number of random bytes behind a freshly issued token.
pub const CAP_TOKEN_BYTES: usize = 32;

/// An opaque bearer credential. Whoever presents it may call the functions of
/// the [`BridgeSpec`](crate::bridge_spec::BridgeSpec) it was issued for.
///
/// Tokens issued locally come from [`CapToken::generate`]; tokens received
/// from a remote app are taken as-is.
#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct CapToken(String);

impl CapToken {
    /// A new unguessable token drawn from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CAP_TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accessor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CapToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// Tokens are credentials, keep them out of debug logs.
impl std::fmt::Debug for CapToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        f.debug_tuple("CapToken")
            .field(&format!("{}…", prefix))
            .finish()
    }
}

/// Further restrictions a caller can ask to be checked when validating a token.
///
/// Nothing is enforced yet; validation accepts any value here, including none.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CapConstraints {}
