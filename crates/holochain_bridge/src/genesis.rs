//! Notifying the local app when a bridge is established.

use crate::error::BridgeError;
use crate::error::BridgeResult;
use crate::runtime::ZomeRuntimeHandle;
use holochain_bridge_types::prelude::*;

/// Target of the app log, the log an app's developers read about their own
/// app, as opposed to the conductor's diagnostics.
pub const APP_LOG_TARGET: &str = "holochain_bridge::app_log";

/// Runs the genesis function of the local app for a newly established bridge.
#[derive(Clone)]
pub struct GenesisNotifier {
    runtime: ZomeRuntimeHandle,
    genesis_fn_name: FunctionName,
}

impl GenesisNotifier {
    /// Constructor
    pub fn new(runtime: ZomeRuntimeHandle, genesis_fn_name: FunctionName) -> Self {
        Self {
            runtime,
            genesis_fn_name,
        }
    }

    /// Call the genesis function of each of `zomes`, in order.
    ///
    /// A zome which errors, or whose genesis function returns `false`, fails
    /// the whole notification.
    #[tracing::instrument(skip(self, app_data))]
    pub async fn notify(
        &self,
        zomes: &[ZomeName],
        direction: GenesisDirection,
        other_side: &AppHash,
        app_data: &str,
    ) -> BridgeResult<()> {
        let input = BridgeGenesisInput {
            direction,
            other_side: other_side.clone(),
            app_data: app_data.to_string(),
        };
        let payload =
            serde_json::to_value(&input).map_err(|e| BridgeError::GenesisFailed(e.to_string()))?;

        for zome_name in zomes {
            let output = self
                .runtime
                .call_zome(zome_name, &self.genesis_fn_name, payload.clone())
                .await
                .map_err(|e| {
                    tracing::warn!(%zome_name, error = %e, "bridge genesis errored");
                    BridgeError::GenesisFailed(format!("{}: {}", zome_name, e))
                })?;
            if output == serde_json::Value::Bool(false) {
                tracing::warn!(%zome_name, "bridge genesis rejected the bridge");
                return Err(BridgeError::GenesisFailed(format!(
                    "{}: {} returned false",
                    zome_name, self.genesis_fn_name
                )));
            }
        }
        Ok(())
    }

    /// Write the app log line for a bridge which is now established.
    pub fn announce(&self, direction: GenesisDirection, other_side: &AppHash, app_data: &str) {
        tracing::info!(
            target: APP_LOG_TARGET,
            "bridge genesis {}-- other side is:{} bridging data:{}",
            direction,
            other_side,
            app_data
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZomeRuntimeError;
    use crate::runtime::MockZomeRuntime;
    use crate::test_utils::LogCapture;
    use matches::assert_matches;
    use std::sync::Arc;

    fn other_side() -> AppHash {
        "QmVGtdTZdTFaLsaj2RwdVG8jcjNNcp1DE914DKZ2kHmXHx"
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn notify_calls_every_zome_without_logging() {
        let logs = LogCapture::new();
        let _guard = logs.set_default();

        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .withf(|_, fn_name, payload| {
                fn_name.as_str() == "bridge_genesis"
                    && payload["direction"] == "to"
                    && payload["app_data"] == "app data"
            })
            .times(2)
            .returning(|_, _, _| Ok(serde_json::Value::Null));

        let notifier = GenesisNotifier::new(Arc::new(runtime), "bridge_genesis".into());
        notifier
            .notify(
                &["zome1".into(), "zome2".into()],
                GenesisDirection::To,
                &other_side(),
                "app data",
            )
            .await
            .unwrap();

        assert!(logs.app_log().is_empty());
    }

    #[test]
    fn announce_writes_the_app_log_line() {
        let logs = LogCapture::new();
        let _guard = logs.set_default();

        let notifier =
            GenesisNotifier::new(Arc::new(MockZomeRuntime::new()), "bridge_genesis".into());
        notifier.announce(GenesisDirection::From, &other_side(), "some data");

        assert_eq!(
            logs.app_log(),
            vec![format!(
                "bridge genesis from-- other side is:{} bridging data:some data",
                other_side()
            )]
        );
    }

    #[tokio::test]
    async fn runtime_error_is_genesis_failure() {
        let logs = LogCapture::new();
        let _guard = logs.set_default();

        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .returning(|_, _, _| Err(ZomeRuntimeError::Guest("nope".into())));

        let notifier = GenesisNotifier::new(Arc::new(runtime), "bridge_genesis".into());
        let result = notifier
            .notify(&["zome1".into()], GenesisDirection::From, &other_side(), "")
            .await;
        assert_matches!(result, Err(BridgeError::GenesisFailed(_)));
        assert!(logs.app_log().is_empty());
    }

    #[tokio::test]
    async fn returning_false_rejects_the_bridge() {
        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .returning(|_, _, _| Ok(serde_json::Value::Bool(false)));

        let notifier = GenesisNotifier::new(Arc::new(runtime), "bridge_genesis".into());
        let result = notifier
            .notify(&["zome1".into()], GenesisDirection::From, &other_side(), "")
            .await;
        assert_matches!(result, Err(BridgeError::GenesisFailed(_)));
    }
}
