//! Authorizing and routing bridged calls.

use crate::capability;
use crate::db::DbWrite;
use crate::error::BridgeError;
use crate::error::BridgeResult;
use crate::registry;
use crate::runtime::ZomeRuntimeHandle;
use crate::transport::BridgeTransportHandle;
use holochain_bridge_types::prelude::*;
use url::Url;

/// What a token allows, as read from the database for a single call.
#[derive(Debug)]
enum ActiveBridge {
    /// The token was issued here; calls run locally within the bridge spec it grants.
    Callee { spec: String },
    /// The token was issued by the app at `url`; calls are sent there.
    Caller { url: Url },
}

/// Entry point of every bridged call. Holds no state between calls: each
/// call reads the bridge and its capability afresh.
#[derive(Clone)]
pub struct BridgeDispatcher {
    db: DbWrite,
    runtime: ZomeRuntimeHandle,
    transport: BridgeTransportHandle,
}

impl BridgeDispatcher {
    /// Constructor
    pub fn new(db: DbWrite, runtime: ZomeRuntimeHandle, transport: BridgeTransportHandle) -> Self {
        Self {
            db,
            runtime,
            transport,
        }
    }

    /// Call `fn_name` in `zome_name` over the bridge identified by `token`.
    ///
    /// If the token belongs to a bridge onto this app, the token must validate
    /// and the function must be in the bridge spec it grants; the call then runs on
    /// the local zome runtime and its output or error is returned unchanged.
    ///
    /// If the token belongs to a bridge from this app, the call is forwarded
    /// to the remote app. The token was issued over there, so that is where
    /// it is validated and checked against the bridge spec.
    #[tracing::instrument(skip(self, args, token))]
    pub async fn call(
        &self,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        args: serde_json::Value,
        token: &CapToken,
    ) -> BridgeResult<serde_json::Value> {
        match self.lookup(token).await? {
            ActiveBridge::Callee { spec } => self.run_local(zome_name, fn_name, args, &spec).await,
            ActiveBridge::Caller { url } => {
                let route = BridgeRoute::new(token.clone(), zome_name.clone(), fn_name.clone());
                Ok(self.transport.forward(&url, &route, args).await?)
            }
        }
    }

    /// Run a call that arrived from another app.
    ///
    /// Only bridges onto this app are considered. A token this app holds for
    /// calling elsewhere is not an active bridge here, so calls never hop on
    /// to a third app.
    #[tracing::instrument(skip(self, args, token))]
    pub async fn serve(
        &self,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        args: serde_json::Value,
        token: &CapToken,
    ) -> BridgeResult<serde_json::Value> {
        match self.lookup(token).await? {
            ActiveBridge::Callee { spec } => self.run_local(zome_name, fn_name, args, &spec).await,
            ActiveBridge::Caller { .. } => Err(BridgeError::NoActiveBridge),
        }
    }

    async fn lookup(&self, token: &CapToken) -> BridgeResult<ActiveBridge> {
        let token = token.clone();
        self.db
            .read_async(move |txn| -> BridgeResult<ActiveBridge> {
                let bridge =
                    registry::get_by_token(txn, &token)?.ok_or(BridgeError::NoActiveBridge)?;
                match bridge.role {
                    BridgeRole::Callee => Ok(ActiveBridge::Callee {
                        spec: capability::validate(txn, &token, None)?,
                    }),
                    BridgeRole::Caller { url, .. } => Ok(ActiveBridge::Caller { url }),
                }
            })
            .await
    }

    async fn run_local(
        &self,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        args: serde_json::Value,
        spec: &str,
    ) -> BridgeResult<serde_json::Value> {
        if !BridgeSpec::decode(spec)?.check(zome_name, fn_name) {
            tracing::debug!(%zome_name, %fn_name, "denied bridged call");
            return Err(BridgeError::FunctionNotBridged);
        }
        Ok(self.runtime.call_zome(zome_name, fn_name, args).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseResult;
    use crate::error::TransportError;
    use crate::error::ZomeRuntimeError;
    use crate::runtime::MockZomeRuntime;
    use crate::test_utils::*;
    use crate::transport::MockBridgeTransport;
    use matches::assert_matches;
    use std::sync::Arc;

    const SPEC: &str = r#"{"zySampleZome":{"testStrFn1":true}}"#;

    /// Write an established bridge, and the capability for it if one is given
    async fn establish(db: &DbWrite, bridge: Bridge, spec: Option<&'static str>) {
        db.write_async(move |txn| -> DatabaseResult<()> {
            if let Some(spec) = spec {
                capability::insert(txn, &bridge.token, spec)?;
            }
            let id = registry::insert_pending(txn, &bridge)?;
            registry::mark_established(txn, id)?;
            Ok(())
        })
        .await
        .unwrap();
    }

    fn dispatcher(
        db: &DbWrite,
        runtime: MockZomeRuntime,
        transport: MockBridgeTransport,
    ) -> BridgeDispatcher {
        BridgeDispatcher::new(db.clone(), Arc::new(runtime), Arc::new(transport))
    }

    fn remote_url() -> Url {
        "http://localhost:31415".parse().unwrap()
    }

    #[tokio::test]
    async fn no_bridge_for_token() {
        let db = DbWrite::test_in_mem().unwrap();
        let d = dispatcher(&db, MockZomeRuntime::new(), MockBridgeTransport::new());
        let result = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn1".into(),
                serde_json::json!("arg1 arg2"),
                &"nobody's token".into(),
            )
            .await;
        assert_matches!(result, Err(BridgeError::NoActiveBridge));
    }

    #[tokio::test]
    async fn callee_bridge_without_capability_is_invalid() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(&db, Bridge::callee(fake_app_hash(1), "tok".into(), ""), None).await;
        let d = dispatcher(&db, MockZomeRuntime::new(), MockBridgeTransport::new());
        let result = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn1".into(),
                serde_json::json!(""),
                &"tok".into(),
            )
            .await;
        assert_matches!(result, Err(BridgeError::InvalidToken));
    }

    #[tokio::test]
    async fn callee_call_runs_locally_within_spec() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(
            &db,
            Bridge::callee(fake_app_hash(1), "tok".into(), ""),
            Some(SPEC),
        )
        .await;

        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .withf(|zome_name, fn_name, payload| {
                zome_name.as_str() == "zySampleZome"
                    && fn_name.as_str() == "testStrFn1"
                    && payload == "arg1 arg2"
            })
            .times(1)
            .returning(|_, _, _| Ok(serde_json::json!("result: arg1 arg2")));
        let d = dispatcher(&db, runtime, MockBridgeTransport::new());

        let output = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn1".into(),
                serde_json::json!("arg1 arg2"),
                &"tok".into(),
            )
            .await
            .unwrap();
        assert_eq!(output, serde_json::json!("result: arg1 arg2"));

        let denied = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn2".into(),
                serde_json::json!("arg1 arg2"),
                &"tok".into(),
            )
            .await;
        assert_matches!(denied, Err(BridgeError::FunctionNotBridged));
    }

    #[tokio::test]
    async fn zome_errors_come_back_verbatim() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(
            &db,
            Bridge::callee(fake_app_hash(1), "tok".into(), ""),
            Some(SPEC),
        )
        .await;
        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .returning(|_, _, _| Err(ZomeRuntimeError::Guest("boom".into())));
        let d = dispatcher(&db, runtime, MockBridgeTransport::new());

        let err = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn1".into(),
                serde_json::json!(null),
                &"tok".into(),
            )
            .await
            .unwrap_err();
        assert_matches!(&err, BridgeError::ZomeCall(ZomeRuntimeError::Guest(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn caller_call_is_forwarded() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(
            &db,
            Bridge::caller(fake_app_hash(2), "other", "remote tok".into(), remote_url(), ""),
            None,
        )
        .await;

        let mut transport = MockBridgeTransport::new();
        transport
            .expect_forward()
            .withf(|url, route, payload| {
                *url == remote_url()
                    && route.token.as_str() == "remote tok"
                    && route.zome_name.as_str() == "anyZome"
                    && route.fn_name.as_str() == "anyFn"
                    && payload == "args"
            })
            .times(1)
            .returning(|_, _, _| Ok(serde_json::json!("remote result")));
        let d = dispatcher(&db, MockZomeRuntime::new(), transport);

        let output = d
            .call(
                &"anyZome".into(),
                &"anyFn".into(),
                serde_json::json!("args"),
                &"remote tok".into(),
            )
            .await
            .unwrap();
        assert_eq!(output, serde_json::json!("remote result"));
    }

    #[tokio::test]
    async fn transport_failures_are_mapped() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(
            &db,
            Bridge::caller(fake_app_hash(2), "other", "remote tok".into(), remote_url(), ""),
            None,
        )
        .await;

        let mut transport = MockBridgeTransport::new();
        transport
            .expect_forward()
            .withf(|_, route, _| route.fn_name.as_str() == "offline")
            .returning(|_, _, _| Err(TransportError::Unreachable("connection refused".into())));
        transport
            .expect_forward()
            .withf(|_, route, _| route.fn_name.as_str() == "private")
            .returning(|_, _, _| Err(TransportError::Remote("function not bridged".into())));
        let d = dispatcher(&db, MockZomeRuntime::new(), transport);

        let result = d
            .call(
                &"anyZome".into(),
                &"offline".into(),
                serde_json::json!(null),
                &"remote tok".into(),
            )
            .await;
        assert_matches!(result, Err(BridgeError::BridgeUnreachable(_)));

        let err = d
            .call(
                &"anyZome".into(),
                &"private".into(),
                serde_json::json!(null),
                &"remote tok".into(),
            )
            .await
            .unwrap_err();
        assert_matches!(&err, BridgeError::Remote(_));
        assert_eq!(err.to_string(), "function not bridged");
    }

    #[tokio::test]
    async fn callee_role_wins_for_a_shared_token() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(
            &db,
            Bridge::caller(fake_app_hash(2), "other", "tok".into(), remote_url(), ""),
            None,
        )
        .await;
        establish(
            &db,
            Bridge::callee(fake_app_hash(2), "tok".into(), ""),
            Some(SPEC),
        )
        .await;

        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .times(1)
            .returning(|_, _, _| Ok(serde_json::json!("local")));
        let d = dispatcher(&db, runtime, MockBridgeTransport::new());

        let output = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn1".into(),
                serde_json::json!(null),
                &"tok".into(),
            )
            .await
            .unwrap();
        assert_eq!(output, serde_json::json!("local"));
    }

    #[tokio::test]
    async fn served_calls_never_hop_onwards() {
        let db = DbWrite::test_in_mem().unwrap();
        establish(
            &db,
            Bridge::caller(fake_app_hash(2), "other", "remote tok".into(), remote_url(), ""),
            None,
        )
        .await;
        // no forward expected
        let d = dispatcher(&db, MockZomeRuntime::new(), MockBridgeTransport::new());

        let result = d
            .serve(
                &"anyZome".into(),
                &"anyFn".into(),
                serde_json::json!(null),
                &"remote tok".into(),
            )
            .await;
        assert_matches!(result, Err(BridgeError::NoActiveBridge));
    }

    #[tokio::test]
    async fn token_of_pending_bridge_is_not_dispatched() {
        let db = DbWrite::test_in_mem().unwrap();
        let bridge = Bridge::callee(fake_app_hash(1), "pending tok".into(), "");
        db.write_async(move |txn| -> DatabaseResult<()> {
            capability::insert(txn, &bridge.token, SPEC)?;
            registry::insert_pending(txn, &bridge)?;
            Ok(())
        })
        .await
        .unwrap();

        let store = crate::capability::CapabilityStore::new(db.clone());
        assert_eq!(
            store.validate(&"pending tok".into(), None).await.unwrap(),
            SPEC
        );

        // no zome call expected
        let d = dispatcher(&db, MockZomeRuntime::new(), MockBridgeTransport::new());
        let result = d
            .call(
                &"zySampleZome".into(),
                &"testStrFn1".into(),
                serde_json::json!(null),
                &"pending tok".into(),
            )
            .await;
        assert_matches!(result, Err(BridgeError::NoActiveBridge));
    }
}
