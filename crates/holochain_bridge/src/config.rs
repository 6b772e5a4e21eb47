//! Configuration of the bridging subsystem of one app instance.

use crate::error::ConfigError;
use crate::error::ConfigResult;
use holochain_bridge_types::manifest::FunctionName;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Name of the zome function run when a bridge is established, unless
/// configured otherwise.
pub const DEFAULT_GENESIS_FN_NAME: &str = "bridge_genesis";

/// All the settings for bridging, as found in the `bridge` section of the
/// app's conductor config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// SQLite file holding tokens and bridges. Kept in memory when unset.
    pub db_path: Option<PathBuf>,

    /// The zome function notified when a bridge is established.
    pub genesis_fn_name: FunctionName,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            genesis_fn_name: DEFAULT_GENESIS_FN_NAME.into(),
        }
    }
}

impl BridgeConfig {
    /// Create a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ConfigError::ConfigMissing(path.into()),
            _ => ConfigError::Io(err),
        })?;
        Self::from_yaml_str(&yaml)
    }
}
