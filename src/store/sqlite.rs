//! SQLite store.
//!
//! # Responsibilities
//! - Own the schema (created on open)
//! - Run every trait method in its own transaction on a blocking thread
//! - Translate UNIQUE violations into `StoreError::Conflict`
//!
//! # Design Decisions
//! - A partial unique index allows at most one `active` parameter row, so a
//!   racing writer fails instead of leaving two active versions
//! - Statistics accumulate with `ON CONFLICT(url) DO UPDATE`, never overwrite

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};

use super::models::*;
use super::{add_request_count, Store, StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS replicas (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    name                  TEXT NOT NULL UNIQUE,
    url                   TEXT NOT NULL UNIQUE,
    health_check_endpoint TEXT NOT NULL,
    status                TEXT NOT NULL,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    type       TEXT NOT NULL,
    message    TEXT NOT NULL,
    replica_id INTEGER REFERENCES replicas(id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS parameter_versions (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    max_life_time       INTEGER NOT NULL,
    pool_size           INTEGER NOT NULL,
    probe_factor        REAL NOT NULL,
    probe_remove_factor INTEGER NOT NULL,
    mu                  INTEGER NOT NULL,
    status              TEXT NOT NULL DEFAULT 'inactive',
    created_at          TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS parameter_versions_one_active
    ON parameter_versions(status) WHERE status = 'active';

CREATE TABLE IF NOT EXISTS statistics (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    url                 TEXT NOT NULL UNIQUE,
    successful_requests INTEGER NOT NULL DEFAULT 0,
    failed_requests     INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);
"#;

const REPLICA_COLUMNS: &str =
    "id, name, url, health_check_endpoint, status, created_at, updated_at";
const PARAMETER_COLUMNS: &str =
    "id, max_life_time, pool_size, probe_factor, probe_remove_factor, mu, status, created_at";
const STATISTICS_COLUMNS: &str =
    "url, successful_requests, failed_requests, created_at, updated_at";

impl ToSql for ReplicaStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ReplicaStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ParameterStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ParameterStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ActivityType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ActivityType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn replica_from_row(row: &Row<'_>) -> rusqlite::Result<Replica> {
    Ok(Replica {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        health_check_endpoint: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn parameter_from_row(row: &Row<'_>) -> rusqlite::Result<ParameterVersion> {
    Ok(ParameterVersion {
        id: row.get(0)?,
        params: ParameterSet {
            max_life_time: row.get(1)?,
            pool_size: row.get(2)?,
            probe_factor: row.get(3)?,
            probe_remove_factor: row.get(4)?,
            mu: row.get(5)?,
        },
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn statistics_from_row(row: &Row<'_>) -> rusqlite::Result<StatisticsRecord> {
    let successful: i64 = row.get(1)?;
    let failed: i64 = row.get(2)?;
    Ok(StatisticsRecord {
        url: row.get(0)?,
        successful_requests: successful.max(0) as u64,
        failed_requests: failed.max(0) as u64,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn map_err(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(
                message
                    .clone()
                    .unwrap_or_else(|| "unique constraint violated".to_string()),
            )
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn to_sql_count(value: u64, url: &str) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::Backend(format!("request counter overflow for '{}'", url)))
}

fn find_replica(tx: &Transaction<'_>, key: &ReplicaKey) -> StoreResult<Option<Replica>> {
    let (column, value): (&str, &dyn ToSql) = match key {
        ReplicaKey::Id(id) => ("id", id as &dyn ToSql),
        ReplicaKey::Url(url) => ("url", url as &dyn ToSql),
        ReplicaKey::Name(name) => ("name", name as &dyn ToSql),
    };
    tx.query_row(
        &format!("SELECT {} FROM replicas WHERE {} = ?1", REPLICA_COLUMNS, column),
        &[value],
        replica_from_row,
    )
    .optional()
    .map_err(map_err)
}

fn find_parameters(tx: &Transaction<'_>, id: i64) -> StoreResult<Option<ParameterVersion>> {
    tx.query_row(
        &format!("SELECT {} FROM parameter_versions WHERE id = ?1", PARAMETER_COLUMNS),
        [id],
        parameter_from_row,
    )
    .optional()
    .map_err(map_err)
}

/// Store backed by a single SQLite database file.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(map_err)?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(map_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(map_err)?;
        conn.execute_batch(SCHEMA).map_err(map_err)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run `f` inside one transaction on the blocking pool.
    /// The transaction commits only if `f` returns `Ok`.
    async fn transact<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StoreError::Backend("sqlite connection lock poisoned".to_string()))?;
            let tx = conn.transaction().map_err(map_err)?;
            let value = f(&tx)?;
            tx.commit().map_err(map_err)?;
            Ok(value)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("sqlite task failed: {}", e)))?
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn replica(&self, key: &ReplicaKey) -> StoreResult<Option<Replica>> {
        let key = key.clone();
        self.transact(move |tx| find_replica(tx, &key)).await
    }

    async fn replicas(&self) -> StoreResult<Vec<Replica>> {
        self.transact(|tx| {
            let mut stmt = tx
                .prepare(&format!("SELECT {} FROM replicas ORDER BY id", REPLICA_COLUMNS))
                .map_err(map_err)?;
            let rows = stmt.query_map([], replica_from_row).map_err(map_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_err)
        })
        .await
    }

    async fn register_replica(&self, new: NewReplica) -> StoreResult<RegisterOutcome> {
        self.transact(move |tx| {
            let now = Utc::now();
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM replicas WHERE name = ?1 AND url = ?2",
                    params![new.name, new.url],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_err)?;

            let (id, created) = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE replicas SET status = ?1, health_check_endpoint = ?2, updated_at = ?3 \
                         WHERE id = ?4",
                        params![ReplicaStatus::Active, new.health_check_endpoint, now, id],
                    )
                    .map_err(map_err)?;
                    (id, false)
                }
                None => {
                    tx.execute(
                        "INSERT INTO replicas (name, url, health_check_endpoint, status, created_at, updated_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        params![new.name, new.url, new.health_check_endpoint, ReplicaStatus::Inactive, now],
                    )
                    .map_err(|e| match map_err(e) {
                        StoreError::Conflict(_) => StoreError::Conflict(format!(
                            "replica name '{}' or url '{}' is already registered",
                            new.name, new.url
                        )),
                        other => other,
                    })?;
                    (tx.last_insert_rowid(), true)
                }
            };

            let replica = find_replica(tx, &ReplicaKey::Id(id))?
                .ok_or_else(|| StoreError::Backend(format!("replica {} vanished", id)))?;
            Ok(RegisterOutcome { replica, created })
        })
        .await
    }

    async fn set_replica_status(
        &self,
        key: &ReplicaKey,
        status: ReplicaStatus,
    ) -> StoreResult<StatusChange> {
        let key = key.clone();
        self.transact(move |tx| {
            let current = find_replica(tx, &key)?
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            tx.execute(
                "UPDATE replicas SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status, Utc::now(), current.id],
            )
            .map_err(map_err)?;
            let replica = find_replica(tx, &ReplicaKey::Id(current.id))?
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            Ok(StatusChange { previous: current.status, replica })
        })
        .await
    }

    async fn compare_and_set_replica_status(
        &self,
        id: i64,
        expected: ReplicaStatus,
        status: ReplicaStatus,
    ) -> StoreResult<Option<Replica>> {
        self.transact(move |tx| {
            let key = ReplicaKey::Id(id);
            if find_replica(tx, &key)?.is_none() {
                return Err(StoreError::NotFound(key.to_string()));
            }
            let changed = tx
                .execute(
                    "UPDATE replicas SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
                    params![status, Utc::now(), id, expected],
                )
                .map_err(map_err)?;
            if changed == 0 {
                return Ok(None);
            }
            find_replica(tx, &key)
        })
        .await
    }

    async fn append_activity(&self, entry: NewActivity) -> StoreResult<ActivityLogEntry> {
        self.transact(move |tx| {
            let created_at = Utc::now();
            tx.execute(
                "INSERT INTO activity_logs (type, message, replica_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![entry.activity_type, entry.message, entry.replica_id, created_at],
            )
            .map_err(map_err)?;
            Ok(ActivityLogEntry {
                id: tx.last_insert_rowid(),
                activity_type: entry.activity_type,
                message: entry.message,
                replica_id: entry.replica_id,
                created_at,
            })
        })
        .await
    }

    async fn activity(&self) -> StoreResult<Vec<ActivityLogEntry>> {
        self.transact(|tx| {
            let mut stmt = tx
                .prepare(
                    "SELECT id, type, message, replica_id, created_at FROM activity_logs \
                     ORDER BY created_at DESC, id DESC",
                )
                .map_err(map_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ActivityLogEntry {
                        id: row.get(0)?,
                        activity_type: row.get(1)?,
                        message: row.get(2)?,
                        replica_id: row.get(3)?,
                        created_at: row.get::<_, DateTime<Utc>>(4)?,
                    })
                })
                .map_err(map_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_err)
        })
        .await
    }

    async fn latest_parameters(&self) -> StoreResult<Option<ParameterVersion>> {
        self.transact(|tx| {
            tx.query_row(
                &format!(
                    "SELECT {} FROM parameter_versions ORDER BY created_at DESC, id DESC LIMIT 1",
                    PARAMETER_COLUMNS
                ),
                [],
                parameter_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn latest_active_parameters(&self) -> StoreResult<Option<ParameterVersion>> {
        self.transact(|tx| {
            tx.query_row(
                &format!(
                    "SELECT {} FROM parameter_versions WHERE status = ?1 \
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                    PARAMETER_COLUMNS
                ),
                [ParameterStatus::Active],
                parameter_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn parameter_versions(&self) -> StoreResult<Vec<ParameterVersion>> {
        self.transact(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM parameter_versions ORDER BY created_at DESC, id DESC",
                    PARAMETER_COLUMNS
                ))
                .map_err(map_err)?;
            let rows = stmt.query_map([], parameter_from_row).map_err(map_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_err)
        })
        .await
    }

    async fn insert_parameters(
        &self,
        params: ParameterSet,
        activation: Activation,
    ) -> StoreResult<ParameterVersion> {
        self.transact(move |tx| {
            if let Activation::Explicit(target) = activation {
                if find_parameters(tx, target)?.is_none() {
                    return Err(StoreError::NotFound(format!("parameter version {}", target)));
                }
            }

            let existing: i64 = tx
                .query_row("SELECT COUNT(*) FROM parameter_versions", [], |row| row.get(0))
                .map_err(map_err)?;
            let status = match activation {
                Activation::IfFirst if existing == 0 => ParameterStatus::Active,
                _ => ParameterStatus::Inactive,
            };

            tx.execute(
                "INSERT INTO parameter_versions \
                 (max_life_time, pool_size, probe_factor, probe_remove_factor, mu, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    params.max_life_time,
                    params.pool_size,
                    params.probe_factor,
                    params.probe_remove_factor,
                    params.mu,
                    status,
                    Utc::now()
                ],
            )
            .map_err(map_err)?;
            let id = tx.last_insert_rowid();

            if let Activation::Explicit(target) = activation {
                // Demote first so the partial unique index never sees two active rows.
                tx.execute(
                    "UPDATE parameter_versions SET status = ?1 WHERE status = ?2",
                    params![ParameterStatus::Inactive, ParameterStatus::Active],
                )
                .map_err(map_err)?;
                tx.execute(
                    "UPDATE parameter_versions SET status = ?1 WHERE id = ?2",
                    params![ParameterStatus::Active, target],
                )
                .map_err(map_err)?;
            }

            find_parameters(tx, id)?
                .ok_or_else(|| StoreError::Backend(format!("parameter version {} vanished", id)))
        })
        .await
    }

    async fn accumulate_statistics(
        &self,
        batch: &[StatisticsDelta],
    ) -> StoreResult<Vec<StatisticsRecord>> {
        let batch = batch.to_vec();
        self.transact(move |tx| {
            let now = Utc::now();
            let mut urls: Vec<String> = Vec::new();
            for delta in &batch {
                let (successful_so_far, failed_so_far) = tx
                    .query_row(
                        "SELECT successful_requests, failed_requests FROM statistics WHERE url = ?1",
                        [&delta.url],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                    )
                    .optional()
                    .map_err(map_err)?
                    .unwrap_or((0, 0));
                let successful = add_request_count(
                    successful_so_far.max(0) as u64,
                    delta.successful_requests,
                    &delta.url,
                )?;
                let failed =
                    add_request_count(failed_so_far.max(0) as u64, delta.failed_requests, &delta.url)?;
                tx.execute(
                    "INSERT INTO statistics (url, successful_requests, failed_requests, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?4) \
                     ON CONFLICT(url) DO UPDATE SET \
                         successful_requests = excluded.successful_requests, \
                         failed_requests = excluded.failed_requests, \
                         updated_at = excluded.updated_at",
                    params![
                        delta.url,
                        to_sql_count(successful, &delta.url)?,
                        to_sql_count(failed, &delta.url)?,
                        now
                    ],
                )
                .map_err(map_err)?;
                if !urls.contains(&delta.url) {
                    urls.push(delta.url.clone());
                }
            }

            let mut records = Vec::with_capacity(urls.len());
            for url in &urls {
                let record = tx
                    .query_row(
                        &format!("SELECT {} FROM statistics WHERE url = ?1", STATISTICS_COLUMNS),
                        [url],
                        statistics_from_row,
                    )
                    .map_err(map_err)?;
                records.push(record);
            }
            Ok(records)
        })
        .await
    }

    async fn statistics(&self) -> StoreResult<Vec<StatisticsRecord>> {
        self.transact(|tx| {
            let mut stmt = tx
                .prepare(&format!("SELECT {} FROM statistics ORDER BY url", STATISTICS_COLUMNS))
                .map_err(map_err)?;
            let rows = stmt.query_map([], statistics_from_row).map_err(map_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_err)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pool_size: i64) -> ParameterSet {
        ParameterSet {
            max_life_time: 60,
            pool_size,
            probe_factor: 2.0,
            probe_remove_factor: 3,
            mu: 1,
        }
    }

    #[tokio::test]
    async fn test_register_and_refresh() {
        let store = SqliteStore::open_in_memory().unwrap();
        let new = NewReplica {
            name: "r1".into(),
            url: "http://10.0.0.1:3000".into(),
            health_check_endpoint: "health".into(),
        };
        let first = store.register_replica(new.clone()).await.unwrap();
        assert!(first.created);
        assert_eq!(first.replica.status, ReplicaStatus::Inactive);

        let refreshed = store
            .register_replica(NewReplica { health_check_endpoint: "ready".into(), ..new })
            .await
            .unwrap();
        assert!(!refreshed.created);
        assert_eq!(refreshed.replica.status, ReplicaStatus::Active);
        assert_eq!(refreshed.replica.health_check_endpoint, "ready");
        assert_eq!(store.replicas().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_url_is_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .register_replica(NewReplica {
                name: "r1".into(),
                url: "http://a".into(),
                health_check_endpoint: "health".into(),
            })
            .await
            .unwrap();
        let err = store
            .register_replica(NewReplica {
                name: "r2".into(),
                url: "http://a".into(),
                health_check_endpoint: "health".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_parameters_keep_single_active_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let v1 = store.insert_parameters(params(11), Activation::IfFirst).await.unwrap();
        let v2 = store.insert_parameters(params(12), Activation::IfFirst).await.unwrap();
        assert!(v1.is_active());
        assert!(!v2.is_active());

        store.insert_parameters(params(13), Activation::Explicit(v2.id)).await.unwrap();
        let active = store.latest_active_parameters().await.unwrap().unwrap();
        assert_eq!(active.id, v2.id);

        let count = store
            .parameter_versions()
            .await
            .unwrap()
            .iter()
            .filter(|v| v.is_active())
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_statistics_accumulate_on_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .accumulate_statistics(&[StatisticsDelta {
                url: "A".into(),
                successful_requests: 5,
                failed_requests: 1,
            }])
            .await
            .unwrap();
        let records = store
            .accumulate_statistics(&[StatisticsDelta {
                url: "A".into(),
                successful_requests: 3,
                failed_requests: 2,
            }])
            .await
            .unwrap();
        assert_eq!(records[0].successful_requests, 8);
        assert_eq!(records[0].failed_requests, 3);
    }

    #[tokio::test]
    async fn test_statistics_batch_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .accumulate_statistics(&[
                StatisticsDelta { url: "A".into(), successful_requests: 1, failed_requests: 0 },
                StatisticsDelta { url: "B".into(), successful_requests: u64::MAX, failed_requests: 0 },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.statistics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counter_overflow_matches_memory_store() {
        let sqlite = SqliteStore::open_in_memory().unwrap();
        let memory = crate::store::MemoryStore::new();
        let near_limit = [StatisticsDelta {
            url: "A".into(),
            successful_requests: crate::store::MAX_REQUEST_COUNT - 2,
            failed_requests: 0,
        }];
        let past_limit = [StatisticsDelta { url: "A".into(), successful_requests: 5, failed_requests: 0 }];

        for store in [&sqlite as &dyn Store, &memory as &dyn Store] {
            store.accumulate_statistics(&near_limit).await.unwrap();
            let err = store.accumulate_statistics(&past_limit).await.unwrap_err();
            assert_eq!(err.to_string(), "store backend error: request counter overflow for 'A'");

            let stats = store.statistics().await.unwrap();
            assert_eq!(stats[0].successful_requests, crate::store::MAX_REQUEST_COUNT - 2);
        }
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .append_activity(NewActivity::success("Prequal Parameters Updated", None))
                .await
                .unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        let entries = reopened.activity().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].activity_type, ActivityType::Success);
    }
}
