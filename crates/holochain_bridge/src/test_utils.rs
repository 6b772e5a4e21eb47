//! Fixtures for testing bridging without a real zome runtime or network.

use crate::config::DEFAULT_GENESIS_FN_NAME;
use crate::db::DbWrite;
use crate::error::ZomeRuntimeError;
use crate::error::ZomeRuntimeResult;
use crate::genesis::APP_LOG_TARGET;
use crate::host::BridgeHost;
use crate::runtime::ZomeRuntime;
use crate::transport::BridgeTransportHandle;
use holochain_bridge_types::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::field::Field;
use tracing::field::Visit;
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

/// An app with two zomes, each with one bridged and one local function.
pub fn sample_manifest() -> AppManifest {
    AppManifest::new(
        "test",
        vec![
            ZomeManifest::new(
                "zySampleZome",
                vec![
                    ZomeFnManifest::bridged("testStrFn1"),
                    ZomeFnManifest::local("testStrFn2"),
                ],
            ),
            ZomeManifest::new(
                "jsSampleZome",
                vec![
                    ZomeFnManifest::bridged("getProperty"),
                    ZomeFnManifest::local("addData"),
                ],
            ),
        ],
    )
}

/// A distinct, stable app hash for each `n`
pub fn fake_app_hash(n: u8) -> AppHash {
    AppHash::from_raw(format!("QmFakeAppHash{:0>33}", n))
}

/// A zome call as seen by [`EchoZomeRuntime`]
pub type RecordedCall = (ZomeName, FunctionName, serde_json::Value);

/// Runs every function of its manifest by echoing string input back as
/// `"result: <input>"`, and accepts every call to its genesis function.
#[derive(Clone)]
pub struct EchoZomeRuntime {
    manifest: Arc<AppManifest>,
    genesis_fn_name: FunctionName,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl EchoZomeRuntime {
    /// Constructor. Genesis is [`DEFAULT_GENESIS_FN_NAME`].
    pub fn new(manifest: AppManifest) -> Self {
        Self {
            manifest: Arc::new(manifest),
            genesis_fn_name: DEFAULT_GENESIS_FN_NAME.into(),
            calls: Default::default(),
        }
    }

    /// Use `name` as the genesis function instead.
    pub fn with_genesis_fn_name(mut self, name: impl Into<FunctionName>) -> Self {
        self.genesis_fn_name = name.into();
        self
    }

    /// The function this runtime treats as genesis
    pub fn genesis_fn_name(&self) -> &FunctionName {
        &self.genesis_fn_name
    }

    /// Every call made so far, genesis included
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// The genesis calls made so far
    pub fn genesis_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|(_, fn_name, _)| fn_name == &self.genesis_fn_name)
            .collect()
    }
}

impl Default for EchoZomeRuntime {
    fn default() -> Self {
        Self::new(sample_manifest())
    }
}

#[async_trait::async_trait]
impl ZomeRuntime for EchoZomeRuntime {
    async fn call_zome(
        &self,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        payload: serde_json::Value,
    ) -> ZomeRuntimeResult<serde_json::Value> {
        self.calls
            .lock()
            .push((zome_name.clone(), fn_name.clone(), payload.clone()));

        let zome = self
            .manifest
            .zome(zome_name)
            .ok_or_else(|| ZomeRuntimeError::FunctionNotFound(zome_name.clone(), fn_name.clone()))?;
        if fn_name == &self.genesis_fn_name {
            return Ok(serde_json::Value::Bool(true));
        }
        if !zome.functions.iter().any(|f| &f.name == fn_name) {
            return Err(ZomeRuntimeError::FunctionNotFound(
                zome_name.clone(),
                fn_name.clone(),
            ));
        }
        match payload {
            serde_json::Value::String(s) => Ok(serde_json::json!(format!("result: {}", s))),
            other => Ok(other),
        }
    }
}

/// A [`BridgeHost`] for the [`sample_manifest`] on an in-memory database,
/// running genesis under the name `runtime` accepts.
pub fn test_host(runtime: EchoZomeRuntime, transport: BridgeTransportHandle) -> BridgeHost {
    BridgeHost::with_db(
        DbWrite::open_in_memory().expect("in-memory db"),
        runtime.genesis_fn_name().clone(),
        sample_manifest(),
        Arc::new(runtime),
        transport,
    )
}

/// Collects the messages of tracing events, for asserting on log output.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<(String, String)>>>,
}

impl LogCapture {
    /// Constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture events from this thread until the guard is dropped.
    pub fn set_default(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// Messages logged to `target`, oldest first
    pub fn messages(&self, target: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Messages of the app log
    pub fn app_log(&self) -> Vec<String> {
        self.messages(APP_LOG_TARGET)
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events
            .lock()
            .push((event.metadata().target().to_string(), visitor.message));
    }
}
