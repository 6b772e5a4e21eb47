//! Errors for decoding bridge data

#![allow(missing_docs)]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeTypesError {
    #[error("Could not decode bridge spec: {0}")]
    SpecDecode(#[source] serde_json::Error),

    #[error("Could not encode bridge spec: {0}")]
    SpecEncode(#[source] serde_json::Error),

    #[error("App hash must not be empty")]
    EmptyAppHash,

    #[error("Malformed app hash: {0:?}")]
    MalformedAppHash(String),

    #[error("Malformed bridge route: {0}")]
    MalformedRoute(String),
}

impl PartialEq for BridgeTypesError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

pub type BridgeTypesResult<T> = Result<T, BridgeTypesError>;
