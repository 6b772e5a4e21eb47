//! Capability store: tokens issued by this app and the bridge spec each one grants.
//!
//! The free functions operate inside a caller-provided transaction so that
//! issuing a token can be made atomic with other writes, like recording the
//! bridge it belongs to. [`CapabilityStore`] wraps them for standalone use.

use crate::db::DbWrite;
use crate::error::BridgeError;
use crate::error::BridgeResult;
use crate::error::DatabaseResult;
use holochain_bridge_types::prelude::*;
use rusqlite::named_params;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;

/// Generate a fresh token and store it along with `spec`.
pub fn issue(txn: &Transaction, spec: &str) -> DatabaseResult<CapToken> {
    let token = CapToken::generate();
    insert(txn, &token, spec)?;
    Ok(token)
}

/// Store a capability under a known token.
pub fn insert(txn: &Transaction, token: &CapToken, spec: &str) -> DatabaseResult<()> {
    txn.execute(
        "INSERT INTO Capability (token, spec) VALUES (:token, :spec)",
        named_params! {
            ":token": token.as_str(),
            ":spec": spec,
        },
    )?;
    Ok(())
}

/// The encoded spec for `token`, if it was issued here.
pub fn get(txn: &Transaction, token: &CapToken) -> DatabaseResult<Option<String>> {
    Ok(txn
        .query_row(
            "SELECT spec FROM Capability WHERE token = :token",
            named_params! {
                ":token": token.as_str()
            },
            |row| row.get(0),
        )
        .optional()?)
}

/// Forget a token. Returns whether it existed.
pub fn delete(txn: &Transaction, token: &CapToken) -> DatabaseResult<bool> {
    let n = txn.execute(
        "DELETE FROM Capability WHERE token = :token",
        named_params! {
            ":token": token.as_str()
        },
    )?;
    Ok(n > 0)
}

/// Check `token` and return the encoded spec it grants, unchanged.
///
/// This only looks at the capability. The token of a bridge which is still
/// being established validates here; bridged calls are refused for it
/// because dispatch first requires an established bridge record.
///
/// `constraints` narrow what a call may do beyond the bridge spec; none are
/// enforced yet.
pub fn validate(
    txn: &Transaction,
    token: &CapToken,
    _constraints: Option<&CapConstraints>,
) -> BridgeResult<String> {
    get(txn, token)?.ok_or(BridgeError::InvalidToken)
}

/// The persistent store of issued capabilities.
#[derive(Clone, Debug)]
pub struct CapabilityStore {
    db: DbWrite,
}

impl CapabilityStore {
    /// Constructor
    pub fn new(db: DbWrite) -> Self {
        Self { db }
    }

    /// Issue a new token granting `spec`.
    pub async fn issue(&self, spec: String) -> BridgeResult<CapToken> {
        let token = self
            .db
            .write_async(move |txn| -> BridgeResult<_> { Ok(issue(txn, &spec)?) })
            .await?;
        tracing::debug!(?token, "issued bridge capability");
        Ok(token)
    }

    /// Check `token` and return the encoded spec it grants. Says nothing about
    /// whether the bridge holding the token is established.
    pub async fn validate(
        &self,
        token: &CapToken,
        constraints: Option<CapConstraints>,
    ) -> BridgeResult<String> {
        let token = token.clone();
        self.db
            .read_async(move |txn| validate(txn, &token, constraints.as_ref()))
            .await
    }
}
