//! Forwarding bridged calls to the app on the other side.

use crate::error::TransportError;
use crate::error::TransportResult;
use holochain_bridge_types::prelude::*;
use std::sync::Arc;
use url::Url;

/// Delivers a bridged call to a remote app and brings back its answer.
///
/// Implementations own retries and timeouts. A failure to reach the remote
/// app must be reported as [`TransportError::Unreachable`], an error returned
/// by the remote app as [`TransportError::Remote`].
#[mockall::automock]
#[async_trait::async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Deliver the call addressed by `route` to the app listening at `url`.
    async fn forward(
        &self,
        url: &Url,
        route: &BridgeRoute,
        payload: serde_json::Value,
    ) -> TransportResult<serde_json::Value>;
}

/// A shareable handle to a [`BridgeTransport`]
pub type BridgeTransportHandle = Arc<dyn BridgeTransport>;

/// Sends bridged calls as HTTP requests, see [`holochain_bridge_types::wire`].
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Use an existing client, e.g. one configured with a timeout
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl BridgeTransport for HttpTransport {
    async fn forward(
        &self,
        url: &Url,
        route: &BridgeRoute,
        payload: serde_json::Value,
    ) -> TransportResult<serde_json::Value> {
        let target = route
            .url(url)
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        tracing::debug!(
            zome = %route.zome_name,
            func = %route.fn_name,
            host = ?target.host_str(),
            "forwarding bridged call"
        );

        let response = self
            .client
            .post(target)
            .json(&payload)
            .send()
            .await
            .map_err(extract_string)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(extract_string)?;
            return Err(TransportError::Remote(if body.is_empty() {
                status.to_string()
            } else {
                body
            }));
        }
        response.json().await.map_err(extract_string)
    }
}

fn extract_string(e: reqwest::Error) -> TransportError {
    TransportError::Unreachable(e.to_string())
}
