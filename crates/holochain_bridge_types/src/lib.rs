//! Holochain Bridge Types: the data shared by both sides of a cross-app bridge.
//!
//! An app exposes a subset of its zome functions to other apps by flagging them
//! as bridged in its manifest. The [`BridgeSpec`](bridge_spec::BridgeSpec) built
//! from that manifest is what a [`CapToken`](capability::CapToken) grants access
//! to, and a [`Bridge`](bridge::Bridge) records one established relationship.
//!
//! Nothing in this crate performs I/O; storage and dispatch live in the
//! `holochain_bridge` crate.

#![deny(missing_docs)]

pub mod app_hash;
pub mod bridge;
pub mod bridge_spec;
pub mod capability;
pub mod error;
pub mod manifest;
pub mod prelude;
pub mod wire;
