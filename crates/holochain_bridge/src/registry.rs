//! The Bridge registry: which apps we are bridged with, and how.
//!
//! A bridge is established in stages. Its record is first written as pending,
//! together with the capability on the callee side. The genesis function runs
//! with no transaction held. If it went through, one transaction retires any
//! bridge the new one replaces and marks the new record established. If it
//! failed, the pending record and the capability issued for it are removed,
//! and whatever bridge existed before is left as it was.
//! Lookups only ever see established records.

use crate::capability;
use crate::db::DbWrite;
use crate::error::BridgeError;
use crate::error::BridgeResult;
use crate::error::DatabaseError;
use crate::error::DatabaseResult;
use crate::genesis::GenesisNotifier;
use holochain_bridge_types::prelude::*;
use rusqlite::named_params;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use std::sync::Arc;
use url::Url;

const SIDE_CALLER: i64 = 0;
const SIDE_CALLEE: i64 = 1;

fn side_to_sql(side: BridgeSide) -> i64 {
    match side {
        BridgeSide::Caller => SIDE_CALLER,
        BridgeSide::Callee => SIDE_CALLEE,
    }
}

const BRIDGE_COLUMNS: &str = "side, remote_app, callee_name, token, url, app_data";

/// A Bridge row as stored, before its values are checked
struct BridgeRow {
    side: i64,
    remote_app: String,
    callee_name: Option<String>,
    token: String,
    url: Option<String>,
    app_data: String,
}

impl BridgeRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            side: row.get("side")?,
            remote_app: row.get("remote_app")?,
            callee_name: row.get("callee_name")?,
            token: row.get("token")?,
            url: row.get("url")?,
            app_data: row.get("app_data")?,
        })
    }

    fn into_bridge(self) -> DatabaseResult<Bridge> {
        let remote_app = AppHash::from_raw(self.remote_app);
        let token = CapToken::from(self.token);
        match self.side {
            SIDE_CALLEE => Ok(Bridge::callee(remote_app, token, self.app_data)),
            SIDE_CALLER => {
                let url = self
                    .url
                    .ok_or_else(|| {
                        DatabaseError::InvalidValue(format!(
                            "caller bridge to {} has no url",
                            remote_app
                        ))
                    })?
                    .parse::<Url>()
                    .map_err(|e| DatabaseError::InvalidValue(e.to_string()))?;
                Ok(Bridge::caller(
                    remote_app,
                    self.callee_name.unwrap_or_default(),
                    token,
                    url,
                    self.app_data,
                ))
            }
            other => Err(DatabaseError::InvalidValue(format!(
                "unknown bridge side {}",
                other
            ))),
        }
    }
}

/// Write a record which is not yet visible to lookups. Returns its row id.
pub fn insert_pending(txn: &Transaction, bridge: &Bridge) -> DatabaseResult<i64> {
    txn.execute(
        "
        INSERT INTO Bridge (side, remote_app, callee_name, token, url, app_data, established)
        VALUES (:side, :remote_app, :callee_name, :token, :url, :app_data, 0)
        ",
        named_params! {
            ":side": side_to_sql(bridge.side()),
            ":remote_app": bridge.remote_app.as_str(),
            ":callee_name": bridge.callee_name(),
            ":token": bridge.token.as_str(),
            ":url": bridge.url().map(Url::as_str),
            ":app_data": bridge.app_data,
        },
    )?;
    Ok(txn.last_insert_rowid())
}

/// Make a pending record visible. Returns false if it no longer exists.
pub fn mark_established(txn: &Transaction, id: i64) -> DatabaseResult<bool> {
    let n = txn.execute(
        "UPDATE Bridge SET established = 1 WHERE id = :id",
        named_params! {
            ":id": id
        },
    )?;
    Ok(n > 0)
}

/// Delete a record by row id, whatever its state.
pub fn delete(txn: &Transaction, id: i64) -> DatabaseResult<()> {
    txn.execute(
        "DELETE FROM Bridge WHERE id = :id",
        named_params! {
            ":id": id
        },
    )?;
    Ok(())
}

/// Whether record `id` exists and is still pending.
pub fn is_pending(txn: &Transaction, id: i64) -> DatabaseResult<bool> {
    Ok(txn
        .query_row(
            "SELECT 1 FROM Bridge WHERE id = :id AND established = 0",
            named_params! {
                ":id": id
            },
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Delete the records for `remote_app` on `side` which are in the given
/// state, and return the tokens they held.
pub fn remove(
    txn: &Transaction,
    remote_app: &AppHash,
    side: BridgeSide,
    established: bool,
) -> DatabaseResult<Vec<CapToken>> {
    let tokens = {
        let mut stmt = txn.prepare(
            "
            SELECT token FROM Bridge
            WHERE remote_app = :remote_app AND side = :side AND established = :established
            ",
        )?;
        let rows = stmt.query_map(
            named_params! {
                ":remote_app": remote_app.as_str(),
                ":side": side_to_sql(side),
                ":established": established,
            },
            |row| row.get::<_, String>(0),
        )?;
        rows.collect::<Result<Vec<_>, _>>()?
    };
    txn.execute(
        "
        DELETE FROM Bridge
        WHERE remote_app = :remote_app AND side = :side AND established = :established
        ",
        named_params! {
            ":remote_app": remote_app.as_str(),
            ":side": side_to_sql(side),
            ":established": established,
        },
    )?;
    Ok(tokens.into_iter().map(CapToken::from).collect())
}

/// Delete the records for `remote_app` on `side` in the given state, along
/// with the capabilities issued for them on the callee side.
fn retire(
    txn: &Transaction,
    remote_app: &AppHash,
    side: BridgeSide,
    established: bool,
) -> DatabaseResult<()> {
    for token in remove(txn, remote_app, side, established)? {
        if side == BridgeSide::Callee {
            capability::delete(txn, &token)?;
        }
        tracing::debug!(%remote_app, ?token, established, "retired bridge");
    }
    Ok(())
}

/// The established bridge using `token`. When we hold the token on both
/// sides, the callee record is the one returned.
pub fn get_by_token(txn: &Transaction, token: &CapToken) -> DatabaseResult<Option<Bridge>> {
    let row = txn
        .query_row(
            &format!(
                "
                SELECT {} FROM Bridge
                WHERE token = :token AND established = 1
                ORDER BY side DESC
                LIMIT 1
                ",
                BRIDGE_COLUMNS
            ),
            named_params! {
                ":token": token.as_str()
            },
            BridgeRow::from_row,
        )
        .optional()?;
    row.map(BridgeRow::into_bridge).transpose()
}

/// The established caller-side bridge to `remote_app`
pub fn get_caller(txn: &Transaction, remote_app: &AppHash) -> DatabaseResult<Option<Bridge>> {
    let row = txn
        .query_row(
            &format!(
                "
                SELECT {} FROM Bridge
                WHERE remote_app = :remote_app AND side = :side AND established = 1
                ",
                BRIDGE_COLUMNS
            ),
            named_params! {
                ":remote_app": remote_app.as_str(),
                ":side": SIDE_CALLER,
            },
            BridgeRow::from_row,
        )
        .optional()?;
    row.map(BridgeRow::into_bridge).transpose()
}

/// Every established bridge, oldest first.
pub fn list(txn: &Transaction) -> DatabaseResult<Vec<Bridge>> {
    let mut stmt = txn.prepare(&format!(
        "SELECT {} FROM Bridge WHERE established = 1 ORDER BY id",
        BRIDGE_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], BridgeRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(BridgeRow::into_bridge).collect()
}

/// A record written as pending, waiting on the outcome of genesis
struct Pending {
    id: i64,
    side: BridgeSide,
    remote_app: AppHash,
    app_data: String,
    issued: Option<CapToken>,
}

/// Creates and looks up the bridges of one app instance.
#[derive(Clone)]
pub struct BridgeRegistry {
    db: DbWrite,
    manifest: Arc<AppManifest>,
    spec: Arc<BridgeSpec>,
    notifier: GenesisNotifier,
}

impl BridgeRegistry {
    /// Constructor. The bridge spec of the app is built here, once.
    pub fn new(db: DbWrite, manifest: Arc<AppManifest>, notifier: GenesisNotifier) -> Self {
        let spec = Arc::new(BridgeSpec::build(&manifest));
        Self {
            db,
            manifest,
            spec,
            notifier,
        }
    }

    /// What this app exposes to the apps bridged onto it
    pub fn spec(&self) -> &BridgeSpec {
        &self.spec
    }

    /// Accept a bridge from `from`, which will call into this app. Returns
    /// the token `from` must present on its calls.
    ///
    /// A previous callee bridge from the same app is replaced once genesis
    /// succeeds, and its token stops being valid. If genesis fails, the
    /// previous bridge stays in place.
    #[tracing::instrument(skip(self, app_data))]
    pub async fn add_bridge_as_callee(
        &self,
        from: AppHash,
        app_data: String,
    ) -> BridgeResult<CapToken> {
        if self.spec.exposes_nothing() {
            tracing::warn!(%from, "accepting a bridge onto an app which exposes no functions");
        }
        let payload = self.spec.encode()?;
        let (id, token) = self
            .db
            .write_async({
                let from = from.clone();
                let app_data = app_data.clone();
                move |txn| -> BridgeResult<_> {
                    retire(txn, &from, BridgeSide::Callee, false)?;
                    let token = capability::issue(txn, &payload)?;
                    let id = insert_pending(txn, &Bridge::callee(from, token.clone(), app_data))?;
                    Ok((id, token))
                }
            })
            .await?;

        let zomes: Vec<ZomeName> = self.spec.bridged_zomes().cloned().collect();
        let pending = Pending {
            id,
            side: BridgeSide::Callee,
            remote_app: from,
            app_data,
            issued: Some(token.clone()),
        };
        let genesis = self
            .notifier
            .notify(
                &zomes,
                pending.side.genesis_direction(),
                &pending.remote_app,
                &pending.app_data,
            )
            .await;
        self.settle(pending, genesis).await?;
        Ok(token)
    }

    /// Record a bridge from `zome_name` of this app onto `to_app`, using a
    /// token `to_app` handed out from its own
    /// [`add_bridge_as_callee`](Self::add_bridge_as_callee).
    ///
    /// A previous caller bridge to the same app is replaced once genesis
    /// succeeds.
    #[tracing::instrument(skip(self, app_data))]
    pub async fn add_bridge_as_caller(
        &self,
        zome_name: ZomeName,
        to_app: AppHash,
        to_name: String,
        token: CapToken,
        url: Url,
        app_data: String,
    ) -> BridgeResult<()> {
        if self.manifest.zome(&zome_name).is_none() {
            return Err(BridgeError::UnknownBridgeModule(zome_name));
        }
        let bridge = Bridge::caller(to_app.clone(), to_name, token, url, app_data.clone());
        let id = self
            .db
            .write_async(move |txn| -> BridgeResult<_> {
                retire(txn, &bridge.remote_app, BridgeSide::Caller, false)?;
                Ok(insert_pending(txn, &bridge)?)
            })
            .await?;

        let pending = Pending {
            id,
            side: BridgeSide::Caller,
            remote_app: to_app,
            app_data,
            issued: None,
        };
        let genesis = self
            .notifier
            .notify(
                std::slice::from_ref(&zome_name),
                pending.side.genesis_direction(),
                &pending.remote_app,
                &pending.app_data,
            )
            .await;
        self.settle(pending, genesis).await
    }

    /// Make the pending record visible if genesis went through, otherwise
    /// undo it. The app log line is only written for a bridge which became
    /// established.
    async fn settle(&self, pending: Pending, genesis: BridgeResult<()>) -> BridgeResult<()> {
        let Pending {
            id,
            side,
            remote_app,
            app_data,
            issued,
        } = pending;
        match genesis {
            Ok(()) => {
                let established = self
                    .db
                    .write_async({
                        let remote_app = remote_app.clone();
                        move |txn| -> BridgeResult<bool> {
                            // A newer establishment for the same app removed our row.
                            if !is_pending(txn, id)? {
                                return Ok(false);
                            }
                            retire(txn, &remote_app, side, true)?;
                            Ok(mark_established(txn, id)?)
                        }
                    })
                    .await?;
                if !established {
                    tracing::warn!(%remote_app, "bridge superseded while being established");
                    return Err(BridgeError::Superseded(remote_app));
                }
                self.notifier
                    .announce(side.genesis_direction(), &remote_app, &app_data);
                Ok(())
            }
            Err(err) => {
                self.db
                    .write_async(move |txn| -> BridgeResult<()> {
                        delete(txn, id)?;
                        if let Some(token) = issued {
                            capability::delete(txn, &token)?;
                        }
                        Ok(())
                    })
                    .await?;
                tracing::warn!(%remote_app, ?err, "bridge not established");
                Err(err)
            }
        }
    }

    /// The token and address for calling `app`, from the caller bridge we
    /// hold to it.
    pub async fn get_bridge_token(&self, app: &AppHash) -> BridgeResult<(CapToken, Url)> {
        let key = app.clone();
        let bridge = self
            .db
            .read_async(move |txn| get_caller(txn, &key))
            .await?;
        match bridge {
            Some(Bridge {
                token,
                role: BridgeRole::Caller { url, .. },
                ..
            }) => Ok((token, url)),
            _ => Err(BridgeError::NotFound(app.clone())),
        }
    }

    /// Every established bridge, in the order they were added.
    pub async fn get_bridges(&self) -> BridgeResult<Vec<Bridge>> {
        Ok(self.db.read_async(list).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockZomeRuntime;
    use crate::test_utils::*;
    use matches::assert_matches;

    fn registry_with(runtime: MockZomeRuntime) -> (DbWrite, BridgeRegistry) {
        let db = DbWrite::test_in_mem().unwrap();
        let notifier = GenesisNotifier::new(Arc::new(runtime), "bridge_genesis".into());
        let registry = BridgeRegistry::new(db.clone(), Arc::new(sample_manifest()), notifier);
        (db, registry)
    }

    fn accepting_runtime() -> MockZomeRuntime {
        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .returning(|_, _, _| Ok(serde_json::Value::Null));
        runtime
    }

    async fn count_rows(db: &DbWrite) -> i64 {
        db.read_async(|txn| -> DatabaseResult<i64> {
            Ok(txn.query_row("SELECT COUNT(*) FROM Bridge", [], |row| row.get(0))?)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn callee_genesis_runs_in_every_bridged_zome() {
        let mut runtime = MockZomeRuntime::new();
        runtime
            .expect_call_zome()
            .withf(|zome_name, _, _| zome_name.as_str() == "jsSampleZome")
            .times(1)
            .returning(|_, _, _| Ok(serde_json::Value::Null));
        runtime
            .expect_call_zome()
            .withf(|zome_name, _, _| zome_name.as_str() == "zySampleZome")
            .times(1)
            .returning(|_, _, _| Ok(serde_json::Value::Null));
        let (_, registry) = registry_with(runtime);

        registry
            .add_bridge_as_callee(fake_app_hash(1), "app data".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn caller_bridge_row_round_trips() {
        let (_, registry) = registry_with(accepting_runtime());
        let url: Url = "http://localhost:31415".parse().unwrap();
        registry
            .add_bridge_as_caller(
                "jsSampleZome".into(),
                fake_app_hash(2),
                "fakeAppName".into(),
                "some token".into(),
                url.clone(),
                "".into(),
            )
            .await
            .unwrap();

        let bridges = registry.get_bridges().await.unwrap();
        assert_eq!(
            bridges,
            vec![Bridge::caller(
                fake_app_hash(2),
                "fakeAppName",
                "some token".into(),
                url,
                ""
            )]
        );
    }

    #[tokio::test]
    async fn failed_genesis_leaves_nothing_behind() {
        let mut runtime = MockZomeRuntime::new();
        runtime.expect_call_zome().returning(|_, _, _| {
            Err(crate::error::ZomeRuntimeError::Guest("no thanks".into()))
        });
        let (db, registry) = registry_with(runtime);

        assert_matches!(
            registry
                .add_bridge_as_callee(fake_app_hash(1), "".into())
                .await,
            Err(BridgeError::GenesisFailed(_))
        );
        assert_eq!(count_rows(&db).await, 0);
        let capabilities: i64 = db
            .read_async(|txn| -> DatabaseResult<i64> {
                Ok(txn.query_row("SELECT COUNT(*) FROM Capability", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(capabilities, 0);
    }

    #[tokio::test]
    async fn pending_rows_are_invisible() {
        let db = DbWrite::test_in_mem().unwrap();
        let url: Url = "http://localhost:31415".parse().unwrap();
        let bridge = Bridge::caller(fake_app_hash(3), "name", "t".into(), url, "");
        let token = bridge.token.clone();
        let remote_app = bridge.remote_app.clone();

        let id = db
            .write_async(move |txn| insert_pending(txn, &bridge))
            .await
            .unwrap();
        let (by_token, by_app, all) = db
            .read_async(move |txn| -> DatabaseResult<_> {
                Ok((
                    get_by_token(txn, &token)?,
                    get_caller(txn, &remote_app)?,
                    list(txn)?,
                ))
            })
            .await
            .unwrap();
        assert_eq!(by_token, None);
        assert_eq!(by_app, None);
        assert!(all.is_empty());

        assert!(db
            .write_async(move |txn| mark_established(txn, id))
            .await
            .unwrap());
        assert_eq!(db.read_async(list).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pending_row_sits_beside_the_established_one() {
        let db = DbWrite::test_in_mem().unwrap();
        let old = Bridge::callee(fake_app_hash(1), "old".into(), "");
        let new = Bridge::callee(fake_app_hash(1), "new".into(), "");

        let new_id = db
            .write_async(move |txn| -> DatabaseResult<i64> {
                let id = insert_pending(txn, &old)?;
                mark_established(txn, id)?;
                insert_pending(txn, &new)
            })
            .await
            .unwrap();
        assert_eq!(count_rows(&db).await, 2);
        assert_eq!(db.read_async(list).await.unwrap().len(), 1);

        let (pending, retired) = db
            .write_async(move |txn| -> DatabaseResult<_> {
                let retired = remove(txn, &fake_app_hash(1), BridgeSide::Callee, true)?;
                Ok((is_pending(txn, new_id)?, retired))
            })
            .await
            .unwrap();
        assert!(pending);
        assert_eq!(retired, vec![CapToken::from("old")]);

        // a second established row for the same app and side is refused
        let err = db
            .write_async(move |txn| -> DatabaseResult<()> {
                mark_established(txn, new_id)?;
                let id = insert_pending(txn, &Bridge::callee(fake_app_hash(1), "x".into(), ""))?;
                mark_established(txn, id)?;
                Ok(())
            })
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn unknown_side_is_an_invalid_value() {
        let db = DbWrite::test_in_mem().unwrap();
        db.write_async(|txn| -> DatabaseResult<()> {
            txn.execute(
                "INSERT INTO Bridge (side, remote_app, token, app_data, established)
                 VALUES (7, 'app', 'tok', '', 1)",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();
        assert_matches!(
            db.read_async(list).await,
            Err(DatabaseError::InvalidValue(_))
        );
    }
}
