//! Common types

pub use crate::capability::CapabilityStore;
pub use crate::config::BridgeConfig;
pub use crate::db::DbWrite;
pub use crate::dispatch::BridgeDispatcher;
pub use crate::error::*;
pub use crate::genesis::GenesisNotifier;
pub use crate::host::BridgeHost;
pub use crate::registry::BridgeRegistry;
pub use crate::runtime::*;
pub use crate::transport::*;
pub use holochain_bridge_types::prelude::*;
