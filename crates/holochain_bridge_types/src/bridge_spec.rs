//! The set of zome functions an app lets other apps call.

use crate::error::BridgeTypesError;
use crate::error::BridgeTypesResult;
use crate::manifest::AppManifest;
use crate::manifest::FunctionName;
use crate::manifest::ZomeName;
use std::collections::BTreeMap;

/// Functions of one zome, mapped to whether they are exposed.
pub type BridgedFunctions = BTreeMap<FunctionName, bool>;

/// Zome name -> function name -> exposed.
///
/// Both levels are ordered maps so that the encoded form is byte-for-byte
/// identical for identical manifests. That encoded form is what a capability
/// stores and what gets compared across apps.
///
/// A zome or function missing from the map is denied, and so is a function
/// mapped to `false`.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    shrinkwraprs::Shrinkwrap,
    derive_more::From,
)]
#[serde(transparent)]
pub struct BridgeSpec(BTreeMap<ZomeName, BridgedFunctions>);

impl BridgeSpec {
    /// Collect every function flagged as bridged in the manifest.
    pub fn build(manifest: &AppManifest) -> Self {
        let mut spec = BTreeMap::new();
        for zome in &manifest.zomes {
            for fn_name in zome.bridged_functions() {
                spec.entry(zome.name.clone())
                    .or_insert_with(BridgedFunctions::new)
                    .insert(fn_name.clone(), true);
            }
        }
        Self(spec)
    }

    /// Whether `zome_name`/`fn_name` may be called over a bridge.
    pub fn check(&self, zome_name: &ZomeName, fn_name: &FunctionName) -> bool {
        self.0
            .get(zome_name)
            .and_then(|fns| fns.get(fn_name))
            .copied()
            .unwrap_or(false)
    }

    /// Whether no function at all is exposed
    pub fn exposes_nothing(&self) -> bool {
        !self.0.values().any(|fns| fns.values().any(|v| *v))
    }

    /// Zomes which expose at least one function
    pub fn bridged_zomes(&self) -> impl Iterator<Item = &ZomeName> {
        self.0
            .iter()
            .filter(|(_, fns)| fns.values().any(|v| *v))
            .map(|(zome_name, _)| zome_name)
    }

    /// Compact JSON, the form stored with a capability.
    pub fn encode(&self) -> BridgeTypesResult<String> {
        serde_json::to_string(self).map_err(BridgeTypesError::SpecEncode)
    }

    /// Inverse of [`BridgeSpec::encode`]
    pub fn decode(payload: &str) -> BridgeTypesResult<Self> {
        serde_json::from_str(payload).map_err(BridgeTypesError::SpecDecode)
    }
}
