//! How a bridged call is addressed when it crosses the network.
//!
//! A call travels as `POST <app url>/bridge/<token>/<zome>/<fn>` with the
//! JSON-encoded arguments as the body. The response body is the JSON-encoded
//! result; any non-success status carries the remote error text.

use crate::capability::CapToken;
use crate::error::BridgeTypesError;
use crate::error::BridgeTypesResult;
use crate::manifest::FunctionName;
use crate::manifest::ZomeName;
use url::Url;

/// First path segment of every bridged call
pub const BRIDGE_ROUTE_PREFIX: &str = "bridge";

/// The addressing part of a bridged call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeRoute {
    /// Token the caller holds for the callee
    pub token: CapToken,
    /// Zome to call
    pub zome_name: ZomeName,
    /// Function to call
    pub fn_name: FunctionName,
}

impl BridgeRoute {
    /// Constructor
    pub fn new(token: CapToken, zome_name: ZomeName, fn_name: FunctionName) -> Self {
        Self {
            token,
            zome_name,
            fn_name,
        }
    }

    /// The full url of this route on the app listening at `base`.
    pub fn url(&self, base: &Url) -> BridgeTypesResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| BridgeTypesError::MalformedRoute(base.to_string()))?
            .pop_if_empty()
            .extend(&[
                BRIDGE_ROUTE_PREFIX,
                self.token.as_str(),
                self.zome_name.as_str(),
                self.fn_name.as_str(),
            ]);
        Ok(url)
    }

    /// Parse the path of an incoming request, with or without a leading `/`.
    pub fn parse(path: &str) -> BridgeTypesResult<Self> {
        let malformed = || BridgeTypesError::MalformedRoute(path.to_string());
        let mut segments = path.trim_start_matches('/').split('/');
        if segments.next() != Some(BRIDGE_ROUTE_PREFIX) {
            return Err(malformed());
        }
        let mut next = || {
            segments
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(malformed)
        };
        let token = CapToken::from(next()?);
        let zome_name = ZomeName::from(next()?);
        let fn_name = FunctionName::from(next()?);
        if segments.next().is_some() {
            return Err(malformed());
        }
        Ok(Self::new(token, zome_name, fn_name))
    }
}
