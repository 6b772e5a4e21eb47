//! Records of established bridges between two apps.

use crate::app_hash::AppHash;
use crate::capability::CapToken;
use url::Url;

/// Which role the local app plays in a bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BridgeSide {
    /// The local app calls into the remote app.
    Caller,
    /// The remote app calls into the local app.
    Callee,
}

impl BridgeSide {
    /// The direction marker handed to the genesis function.
    pub fn genesis_direction(&self) -> GenesisDirection {
        match self {
            BridgeSide::Caller => GenesisDirection::From,
            BridgeSide::Callee => GenesisDirection::To,
        }
    }
}

/// The side-specific half of a [`Bridge`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BridgeRole {
    /// A remote app bridged onto us. Calls with the token run locally.
    Callee,
    /// We bridged onto a remote app. Calls with the token are forwarded to it.
    Caller {
        /// Human-readable name of the remote app
        callee_name: String,
        /// Where the remote app accepts bridged calls
        url: Url,
    },
}

/// One established relationship with another app.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Bridge {
    /// The other app. For a callee bridge this is the app calling us, for a
    /// caller bridge it is the app we call.
    pub remote_app: AppHash,
    /// The token used on calls over this bridge
    pub token: CapToken,
    /// Opaque data passed during the handshake
    pub app_data: String,
    /// Side-specific details
    pub role: BridgeRole,
}

impl Bridge {
    /// Record for a remote app bridging onto this one
    pub fn callee(remote_app: AppHash, token: CapToken, app_data: impl Into<String>) -> Self {
        Self {
            remote_app,
            token,
            app_data: app_data.into(),
            role: BridgeRole::Callee,
        }
    }

    /// Record for this app bridging onto a remote one
    pub fn caller(
        remote_app: AppHash,
        callee_name: impl Into<String>,
        token: CapToken,
        url: Url,
        app_data: impl Into<String>,
    ) -> Self {
        Self {
            remote_app,
            token,
            app_data: app_data.into(),
            role: BridgeRole::Caller {
                callee_name: callee_name.into(),
                url,
            },
        }
    }

    /// Which side of the bridge we are on
    pub fn side(&self) -> BridgeSide {
        match self.role {
            BridgeRole::Callee => BridgeSide::Callee,
            BridgeRole::Caller { .. } => BridgeSide::Caller,
        }
    }

    /// Name of the remote app, only known on the caller side
    pub fn callee_name(&self) -> Option<&str> {
        match &self.role {
            BridgeRole::Callee => None,
            BridgeRole::Caller { callee_name, .. } => Some(callee_name),
        }
    }

    /// Endpoint of the remote app, only known on the caller side
    pub fn url(&self) -> Option<&Url> {
        match &self.role {
            BridgeRole::Callee => None,
            BridgeRole::Caller { url, .. } => Some(url),
        }
    }
}

/// Marker telling the genesis function which way the bridge points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum GenesisDirection {
    /// Another app bridged to us
    #[display(fmt = "to")]
    To,
    /// We bridged from here to another app
    #[display(fmt = "from")]
    From,
}

/// The input of the genesis function run when a bridge is established.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BridgeGenesisInput {
    /// Which way the bridge points
    pub direction: GenesisDirection,
    /// The app on the other side
    pub other_side: AppHash,
    /// Handshake data
    pub app_data: String,
}
