//! Durable tier backed by a single SQLite connection.
//!
//! One row per cache entry; the JSON value is stored as text. WAL mode keeps
//! reads from blocking on the writer when several processes share a file.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use tollgate_core::errors::{StorageError, TollgateResult};
use tollgate_core::models::CacheItem;
use tollgate_core::traits::ICacheTier;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache_entries (
        key           TEXT PRIMARY KEY NOT NULL,
        data          TEXT NOT NULL,
        timestamp     INTEGER NOT NULL,
        ttl           INTEGER NOT NULL,
        access_count  INTEGER NOT NULL DEFAULT 0,
        last_accessed INTEGER NOT NULL
    );
";

/// SQLite-backed durable tier.
pub struct SqliteTier {
    conn: Mutex<Connection>,
}

impl SqliteTier {
    /// Open (or create) a tier stored in a file.
    pub fn open(path: &Path) -> TollgateResult<Self> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        apply_pragmas(&conn)?;
        Self::initialize(conn)
    }

    /// Open a tier that lives only as long as this value.
    pub fn open_in_memory() -> TollgateResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> TollgateResult<Self> {
        conn.execute_batch(SCHEMA).map_err(to_storage_err)?;
        debug!("sqlite cache tier initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> TollgateResult<T>
    where
        F: FnOnce(&Connection) -> TollgateResult<T>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned {
            tier: "sqlite".to_string(),
        })?;
        f(&guard)
    }
}

fn apply_pragmas(conn: &Connection) -> TollgateResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .map_err(to_storage_err)?;
    Ok(())
}

fn to_storage_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

impl ICacheTier for SqliteTier {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self, key: &str) -> TollgateResult<Option<CacheItem<Value>>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT data, timestamp, ttl, access_count, last_accessed
                     FROM cache_entries WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(to_storage_err)?;

            let Some((data, timestamp, ttl, access_count, last_accessed)) = row else {
                return Ok(None);
            };
            let data: Value =
                serde_json::from_str(&data).map_err(|e| StorageError::CorruptEntry {
                    tier: "sqlite".to_string(),
                    key: key.to_string(),
                    details: e.to_string(),
                })?;
            Ok(Some(CacheItem {
                data,
                timestamp,
                ttl: u64::try_from(ttl).unwrap_or(0),
                access_count: u64::try_from(access_count).unwrap_or(0),
                last_accessed,
            }))
        })
    }

    fn write(&self, key: &str, item: &CacheItem<Value>) -> TollgateResult<()> {
        let data = item.data.to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cache_entries (key, data, timestamp, ttl, access_count, last_accessed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(key) DO UPDATE SET
                    data = excluded.data,
                    timestamp = excluded.timestamp,
                    ttl = excluded.ttl,
                    access_count = excluded.access_count,
                    last_accessed = excluded.last_accessed",
                params![
                    key,
                    data,
                    item.timestamp,
                    i64::try_from(item.ttl).unwrap_or(i64::MAX),
                    i64::try_from(item.access_count).unwrap_or(i64::MAX),
                    item.last_accessed,
                ],
            )
            .map_err(to_storage_err)?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> TollgateResult<bool> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
                .map_err(to_storage_err)?;
            Ok(changed > 0)
        })
    }

    fn keys_with_prefix(&self, prefix: &str) -> TollgateResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT key FROM cache_entries
                     WHERE substr(key, 1, length(?1)) = ?1
                     ORDER BY key",
                )
                .map_err(to_storage_err)?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get::<_, String>(0))
                .map_err(to_storage_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(to_storage_err)?;
            Ok(keys)
        })
    }
}
