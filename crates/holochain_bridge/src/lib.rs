//! # Holochain cross-app bridging
//!
//! One app instance can expose some of its zome functions to another app
//! instance, and call into the functions another app exposes to it. Access is
//! granted by capability tokens bound to the exposing app's
//! [`BridgeSpec`](holochain_bridge_types::bridge_spec::BridgeSpec).
//!
//! The building blocks, leaf first:
//!
//! - [`capability`]: the store of issued tokens and what they grant.
//! - [`registry`]: the persisted [`Bridge`](holochain_bridge_types::bridge::Bridge)
//!   records and the handshake that creates them.
//! - [`genesis`]: runs the genesis function of the local app when a bridge is
//!   established, and writes the app log line for it.
//! - [`dispatch`]: authorizes every bridged call and either runs it locally or
//!   forwards it to the remote app.
//! - [`host`]: ties the above to one app instance.
//!
//! The zome runtime and the network are collaborators, reached through the
//! [`ZomeRuntime`](runtime::ZomeRuntime) and
//! [`BridgeTransport`](transport::BridgeTransport) traits.

pub mod capability;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod genesis;
pub mod host;
pub mod prelude;
pub mod registry;
pub mod runtime;
pub mod transport;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
