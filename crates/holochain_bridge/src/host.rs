//! Everything bridging needs for one app instance, in one place.

use crate::capability::CapabilityStore;
use crate::config::BridgeConfig;
use crate::db::DbWrite;
use crate::dispatch::BridgeDispatcher;
use crate::error::BridgeResult;
use crate::genesis::GenesisNotifier;
use crate::registry::BridgeRegistry;
use crate::runtime::ZomeRuntimeHandle;
use crate::transport::BridgeTransportHandle;
use holochain_bridge_types::prelude::*;
use std::sync::Arc;
use url::Url;

/// The bridging subsystem of one app instance.
///
/// Cheap to clone. All clones share the same database, so they see the same
/// bridges and capabilities.
#[derive(Clone)]
pub struct BridgeHost {
    manifest: Arc<AppManifest>,
    capabilities: CapabilityStore,
    registry: BridgeRegistry,
    dispatcher: BridgeDispatcher,
}

impl BridgeHost {
    /// Open the database named in `config` and set up bridging for the app
    /// described by `manifest`.
    pub fn new(
        config: &BridgeConfig,
        manifest: AppManifest,
        runtime: ZomeRuntimeHandle,
        transport: BridgeTransportHandle,
    ) -> BridgeResult<Self> {
        let db = DbWrite::from_config(config)?;
        Ok(Self::with_db(
            db,
            config.genesis_fn_name.clone(),
            manifest,
            runtime,
            transport,
        ))
    }

    /// Set up bridging on an already open database
    pub fn with_db(
        db: DbWrite,
        genesis_fn_name: FunctionName,
        manifest: AppManifest,
        runtime: ZomeRuntimeHandle,
        transport: BridgeTransportHandle,
    ) -> Self {
        let manifest = Arc::new(manifest);
        let notifier = GenesisNotifier::new(runtime.clone(), genesis_fn_name);
        Self {
            capabilities: CapabilityStore::new(db.clone()),
            registry: BridgeRegistry::new(db.clone(), manifest.clone(), notifier),
            dispatcher: BridgeDispatcher::new(db, runtime, transport),
            manifest,
        }
    }

    /// The manifest of the local app
    pub fn manifest(&self) -> &AppManifest {
        &self.manifest
    }

    /// What the local app exposes to apps bridged onto it
    pub fn spec(&self) -> &BridgeSpec {
        self.registry.spec()
    }

    /// The tokens issued by the local app
    pub fn capabilities(&self) -> &CapabilityStore {
        &self.capabilities
    }

    /// See [`BridgeRegistry::add_bridge_as_callee`]
    pub async fn add_bridge_as_callee(
        &self,
        from: AppHash,
        app_data: impl Into<String>,
    ) -> BridgeResult<CapToken> {
        self.registry
            .add_bridge_as_callee(from, app_data.into())
            .await
    }

    /// See [`BridgeRegistry::add_bridge_as_caller`]
    pub async fn add_bridge_as_caller(
        &self,
        zome_name: ZomeName,
        to_app: AppHash,
        to_name: impl Into<String>,
        token: CapToken,
        url: Url,
        app_data: impl Into<String>,
    ) -> BridgeResult<()> {
        self.registry
            .add_bridge_as_caller(
                zome_name,
                to_app,
                to_name.into(),
                token,
                url,
                app_data.into(),
            )
            .await
    }

    /// See [`BridgeRegistry::get_bridge_token`]
    pub async fn get_bridge_token(&self, app: &AppHash) -> BridgeResult<(CapToken, Url)> {
        self.registry.get_bridge_token(app).await
    }

    /// See [`BridgeRegistry::get_bridges`]
    pub async fn get_bridges(&self) -> BridgeResult<Vec<Bridge>> {
        self.registry.get_bridges().await
    }

    /// See [`BridgeDispatcher::call`]
    pub async fn bridge_call(
        &self,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        args: serde_json::Value,
        token: &CapToken,
    ) -> BridgeResult<serde_json::Value> {
        self.dispatcher.call(zome_name, fn_name, args, token).await
    }

    /// Call a function of `app`, which this app must have bridged onto.
    pub async fn call_app(
        &self,
        app: &AppHash,
        zome_name: &ZomeName,
        fn_name: &FunctionName,
        args: serde_json::Value,
    ) -> BridgeResult<serde_json::Value> {
        let (token, _) = self.get_bridge_token(app).await?;
        self.dispatcher.call(zome_name, fn_name, args, &token).await
    }

    /// Serve a bridged call which arrived over the network at `path`, see
    /// [`holochain_bridge_types::wire`] for the route format.
    pub async fn handle_route(
        &self,
        path: &str,
        args: serde_json::Value,
    ) -> BridgeResult<serde_json::Value> {
        let route = BridgeRoute::parse(path)?;
        self.dispatcher
            .serve(&route.zome_name, &route.fn_name, args, &route.token)
            .await
    }
}
