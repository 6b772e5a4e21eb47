//! The SQLite database behind the capability store and the bridge registry.
//!
//! All access goes through one connection guarded by a mutex, so every
//! transaction, read or write, is serialized. A reader always sees a
//! consistent snapshot and a write is atomic with respect to every reader.

use crate::config::BridgeConfig;
use crate::error::DatabaseError;
use crate::error::DatabaseResult;
use parking_lot::Mutex;
use rusqlite::Connection;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const SCHEMA: &str = include_str!("sql/schema.sql");

/// Handle to the bridge database. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct DbWrite {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for DbWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbWrite").field("path", &self.path).finish()
    }
}

impl DbWrite {
    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryMissing(parent.to_owned(), e))?;
            }
        }
        let conn = Connection::open(path)?;
        // tell SQLite to wait this long during write contention
        conn.busy_timeout(SQLITE_BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::initialize(conn, Some(path.to_owned()))
    }

    /// A database which lives only as long as this handle and its clones
    pub fn open_in_memory() -> DatabaseResult<Self> {
        Self::initialize(Connection::open_in_memory()?, None)
    }

    /// Open whatever database the config points at
    pub fn from_config(config: &BridgeConfig) -> DatabaseResult<Self> {
        match &config.db_path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    /// Shorthand for an in-memory database in tests
    #[cfg(any(test, feature = "test_utils"))]
    pub fn test_in_mem() -> DatabaseResult<Self> {
        Self::open_in_memory()
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> DatabaseResult<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(?path, "bridge database ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// The database file, if not in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a closure with a read transaction.
    /// Nothing done inside it is committed.
    pub async fn read_async<E, R, F>(&self, f: F) -> Result<R, E>
    where
        E: From<DatabaseError> + Send + 'static,
        R: Send + 'static,
        F: FnOnce(&Transaction) -> Result<R, E> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            let txn = conn.transaction().map_err(DatabaseError::from)?;
            f(&txn)
        })
        .await
        .map_err(DatabaseError::from)?
    }

    /// Run a closure with an exclusive read-write transaction, and commit
    /// the transaction if the closure returns `Ok`.
    pub async fn write_async<E, R, F>(&self, f: F) -> Result<R, E>
    where
        E: From<DatabaseError> + Send + 'static,
        R: Send + 'static,
        F: FnOnce(&mut Transaction) -> Result<R, E> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            let mut txn = conn
                .transaction_with_behavior(TransactionBehavior::Exclusive)
                .map_err(DatabaseError::from)?;
            let result = f(&mut txn)?;
            txn.commit().map_err(DatabaseError::from)?;
            Ok(result)
        })
        .await
        .map_err(DatabaseError::from)?
    }
}
