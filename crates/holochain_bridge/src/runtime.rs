//! The local app's zome runtime, as seen by the bridge.

use crate::error::ZomeRuntimeResult;
use holochain_bridge_types::prelude::*;
use std::sync::Arc;

/// Runs zome functions of the local app.
///
/// The bridge only decides whether a call is allowed; running it is up to
/// the implementor. Any cancellation or timeout policy also lives there.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ZomeRuntime: Send + Sync {
    /// Call `fn_name` in `zome_name` with `payload` and return its output.
    async fn call_zome(
        &self,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        payload: serde_json::Value,
    ) -> ZomeRuntimeResult<serde_json::Value>;
}

/// A shareable handle to a [`ZomeRuntime`]
pub type ZomeRuntimeHandle = Arc<dyn ZomeRuntime>;
