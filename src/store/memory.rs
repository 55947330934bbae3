//! In-memory store.
//!
//! All tables live behind one mutex, so every trait method is trivially
//! atomic. Batch writes are applied to a staged copy and swapped in only when
//! every record succeeded.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::models::*;
use super::{add_request_count, Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    replicas: Vec<Replica>,
    activity: Vec<ActivityLogEntry>,
    parameters: Vec<ParameterVersion>,
    statistics: BTreeMap<String, StatisticsRecord>,
    last_replica_id: i64,
    last_activity_id: i64,
    last_parameter_id: i64,
}

impl Tables {
    fn find_replica(&self, key: &ReplicaKey) -> Option<usize> {
        self.replicas.iter().position(|r| match key {
            ReplicaKey::Id(id) => r.id == *id,
            ReplicaKey::Url(url) => &r.url == url,
            ReplicaKey::Name(name) => &r.name == name,
        })
    }
}

/// Store backed by process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn replica(&self, key: &ReplicaKey) -> StoreResult<Option<Replica>> {
        let tables = self.lock()?;
        Ok(tables.find_replica(key).map(|idx| tables.replicas[idx].clone()))
    }

    async fn replicas(&self) -> StoreResult<Vec<Replica>> {
        Ok(self.lock()?.replicas.clone())
    }

    async fn register_replica(&self, new: NewReplica) -> StoreResult<RegisterOutcome> {
        let mut tables = self.lock()?;
        let now = Utc::now();

        if let Some(existing) = tables
            .replicas
            .iter_mut()
            .find(|r| r.name == new.name && r.url == new.url)
        {
            existing.status = ReplicaStatus::Active;
            existing.health_check_endpoint = new.health_check_endpoint;
            existing.updated_at = now;
            return Ok(RegisterOutcome { replica: existing.clone(), created: false });
        }

        if tables.replicas.iter().any(|r| r.name == new.name) {
            return Err(StoreError::Conflict(format!(
                "replica name '{}' is already registered with another url",
                new.name
            )));
        }
        if tables.replicas.iter().any(|r| r.url == new.url) {
            return Err(StoreError::Conflict(format!(
                "replica url '{}' is already registered under another name",
                new.url
            )));
        }

        tables.last_replica_id += 1;
        let replica = Replica {
            id: tables.last_replica_id,
            name: new.name,
            url: new.url,
            health_check_endpoint: new.health_check_endpoint,
            status: ReplicaStatus::Inactive,
            created_at: now,
            updated_at: now,
        };
        tables.replicas.push(replica.clone());
        Ok(RegisterOutcome { replica, created: true })
    }

    async fn set_replica_status(
        &self,
        key: &ReplicaKey,
        status: ReplicaStatus,
    ) -> StoreResult<StatusChange> {
        let mut tables = self.lock()?;
        let idx = tables
            .find_replica(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let replica = &mut tables.replicas[idx];
        let previous = replica.status;
        replica.status = status;
        replica.updated_at = Utc::now();
        Ok(StatusChange { previous, replica: replica.clone() })
    }

    async fn compare_and_set_replica_status(
        &self,
        id: i64,
        expected: ReplicaStatus,
        status: ReplicaStatus,
    ) -> StoreResult<Option<Replica>> {
        let mut tables = self.lock()?;
        let key = ReplicaKey::Id(id);
        let idx = tables
            .find_replica(&key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let replica = &mut tables.replicas[idx];
        if replica.status != expected {
            return Ok(None);
        }
        replica.status = status;
        replica.updated_at = Utc::now();
        Ok(Some(replica.clone()))
    }

    async fn append_activity(&self, entry: NewActivity) -> StoreResult<ActivityLogEntry> {
        let mut tables = self.lock()?;
        tables.last_activity_id += 1;
        let stored = ActivityLogEntry {
            id: tables.last_activity_id,
            activity_type: entry.activity_type,
            message: entry.message,
            replica_id: entry.replica_id,
            created_at: Utc::now(),
        };
        tables.activity.push(stored.clone());
        Ok(stored)
    }

    async fn activity(&self) -> StoreResult<Vec<ActivityLogEntry>> {
        let tables = self.lock()?;
        Ok(tables.activity.iter().rev().cloned().collect())
    }

    async fn latest_parameters(&self) -> StoreResult<Option<ParameterVersion>> {
        let tables = self.lock()?;
        Ok(tables
            .parameters
            .iter()
            .max_by_key(|v| (v.created_at, v.id))
            .cloned())
    }

    async fn latest_active_parameters(&self) -> StoreResult<Option<ParameterVersion>> {
        let tables = self.lock()?;
        Ok(tables
            .parameters
            .iter()
            .filter(|v| v.is_active())
            .max_by_key(|v| (v.created_at, v.id))
            .cloned())
    }

    async fn parameter_versions(&self) -> StoreResult<Vec<ParameterVersion>> {
        let tables = self.lock()?;
        let mut versions = tables.parameters.clone();
        versions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(versions)
    }

    async fn insert_parameters(
        &self,
        params: ParameterSet,
        activation: Activation,
    ) -> StoreResult<ParameterVersion> {
        let mut tables = self.lock()?;

        if let Activation::Explicit(target) = activation {
            if !tables.parameters.iter().any(|v| v.id == target) {
                return Err(StoreError::NotFound(format!("parameter version {}", target)));
            }
        }

        let status = match activation {
            Activation::IfFirst if tables.parameters.is_empty() => ParameterStatus::Active,
            _ => ParameterStatus::Inactive,
        };

        tables.last_parameter_id += 1;
        let id = tables.last_parameter_id;
        tables.parameters.push(ParameterVersion {
            id,
            params,
            status,
            created_at: Utc::now(),
        });

        if let Activation::Explicit(target) = activation {
            for version in tables.parameters.iter_mut() {
                version.status = if version.id == target {
                    ParameterStatus::Active
                } else {
                    ParameterStatus::Inactive
                };
            }
        }

        tables
            .parameters
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| StoreError::Backend(format!("parameter version {} vanished", id)))
    }

    async fn accumulate_statistics(
        &self,
        batch: &[StatisticsDelta],
    ) -> StoreResult<Vec<StatisticsRecord>> {
        let mut tables = self.lock()?;
        let mut staged = tables.statistics.clone();
        let now = Utc::now();
        let mut touched: Vec<&str> = Vec::new();

        for delta in batch {
            let record = staged.entry(delta.url.clone()).or_insert_with(|| StatisticsRecord {
                url: delta.url.clone(),
                successful_requests: 0,
                failed_requests: 0,
                created_at: now,
                updated_at: now,
            });
            record.successful_requests =
                add_request_count(record.successful_requests, delta.successful_requests, &delta.url)?;
            record.failed_requests =
                add_request_count(record.failed_requests, delta.failed_requests, &delta.url)?;
            record.updated_at = now;

            if !touched.contains(&delta.url.as_str()) {
                touched.push(&delta.url);
            }
        }

        let records = touched
            .iter()
            .filter_map(|url| staged.get(*url).cloned())
            .collect();
        tables.statistics = staged;
        Ok(records)
    }

    async fn statistics(&self) -> StoreResult<Vec<StatisticsRecord>> {
        Ok(self.lock()?.statistics.values().cloned().collect())
    }
}
