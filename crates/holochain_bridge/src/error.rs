//! Errors of the bridge and of its collaborators

// missing_docs allowed here since the errors already have self-descriptive strings
#![allow(missing_docs)]

use holochain_bridge_types::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error("A database task did not run to completion: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("There is an unexpected value in the bridge database: {0}")]
    InvalidValue(String),

    #[error("Bridge database directory could not be created at {0}: {1}")]
    DirectoryMissing(PathBuf, #[source] std::io::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Failure reported by the zome runtime. Passed back to bridge callers as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZomeRuntimeError {
    #[error("{0}")]
    Guest(String),

    #[error("Zome function not found: {0}/{1}")]
    FunctionNotFound(ZomeName, FunctionName),

    #[error("Zome runtime error: {0}")]
    Host(String),
}

pub type ZomeRuntimeResult<T> = Result<T, ZomeRuntimeError>;

/// Failure reported by the network transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote app could not be reached or gave no usable answer.
    #[error("{0}")]
    Unreachable(String),

    /// The remote app answered with an error.
    #[error("{0}")]
    Remote(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("no active bridge")]
    NoActiveBridge,

    #[error("invalid token")]
    InvalidToken,

    #[error("function not bridged")]
    FunctionNotBridged,

    #[error("error getting bridging zome: unknown zome: {0}")]
    UnknownBridgeModule(ZomeName),

    #[error("bridge unreachable: {0}")]
    BridgeUnreachable(String),

    #[error("bridge genesis failed: {0}")]
    GenesisFailed(String),

    #[error("no bridge to app: {0}")]
    NotFound(AppHash),

    /// Another bridge to the same app was added while this one was being
    /// established, and replaced it.
    #[error("bridge to {0} was replaced while being established")]
    Superseded(AppHash),

    /// Error returned by the app on the other side of a caller bridge
    #[error("{0}")]
    Remote(String),

    /// Error returned by the local zome runtime
    #[error(transparent)]
    ZomeCall(#[from] ZomeRuntimeError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Types(#[from] BridgeTypesError),
}

impl From<rusqlite::Error> for BridgeError {
    fn from(e: rusqlite::Error) -> Self {
        BridgeError::Database(e.into())
    }
}

impl From<TransportError> for BridgeError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Unreachable(reason) => BridgeError::BridgeUnreachable(reason),
            TransportError::Remote(msg) => BridgeError::Remote(msg),
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No bridge config found at this path: {0}")]
    ConfigMissing(PathBuf),

    #[error("Bridge config could not be parsed: {0}")]
    Deserialization(#[from] serde_yaml::Error),

    #[error("Error reading bridge config: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
