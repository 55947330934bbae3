//! Replica state machine, health gating and audit trail.

use std::sync::Arc;

use crate::error::{AdminError, AdminResult};
use crate::health::HealthProbe;
use crate::messaging::envelope::{Command, ReplicaRef};
use crate::messaging::publisher::{Applied, CommandPublisher, Delivery};
use crate::observability::metrics;
use crate::replicas::validation;
use crate::security::CallerIdentity;
use crate::store::{
    ActivityLogEntry, NewActivity, NewReplica, Replica, ReplicaKey, ReplicaStatus, Store,
};

/// Exactly one of id or url, as accepted by `disable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaSelector {
    Id(i64),
    Url(String),
}

impl ReplicaSelector {
    pub fn from_parts(id: Option<i64>, url: Option<String>) -> AdminResult<Self> {
        match (id, url.filter(|u| !u.trim().is_empty())) {
            (Some(id), None) => Ok(ReplicaSelector::Id(id)),
            (None, Some(url)) => Ok(ReplicaSelector::Url(url)),
            (Some(_), Some(_)) => Err(AdminError::validation("provide either id or url, not both")),
            (None, None) => Err(AdminError::validation("either id or url is required")),
        }
    }

    fn key(&self) -> ReplicaKey {
        match self {
            ReplicaSelector::Id(id) => ReplicaKey::Id(*id),
            ReplicaSelector::Url(url) => ReplicaKey::Url(url.clone()),
        }
    }
}

/// What the proxy fleet reported about a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetReport {
    Added,
    Failed,
    Removed,
}

pub struct ReplicaManager {
    store: Arc<dyn Store>,
    probe: Arc<dyn HealthProbe>,
    publisher: Arc<CommandPublisher>,
    trust_replica_added: bool,
}

impl ReplicaManager {
    pub fn new(
        store: Arc<dyn Store>,
        probe: Arc<dyn HealthProbe>,
        publisher: Arc<CommandPublisher>,
        trust_replica_added: bool,
    ) -> Self {
        Self { store, probe, publisher, trust_replica_added }
    }

    /// Validate, probe, then insert (or reactivate) the replica and announce it.
    pub async fn register(
        &self,
        caller: &CallerIdentity,
        name: &str,
        url: &str,
        health_check_endpoint: &str,
    ) -> AdminResult<Applied<Replica>> {
        validation::require_fields(name, url, health_check_endpoint)?;
        let probe_url = validation::probe_url(url, health_check_endpoint)?;

        self.probe
            .probe(&probe_url)
            .await
            .map_err(|failure| AdminError::HealthCheckFailed {
                url: probe_url.to_string(),
                reason: failure.to_string(),
            })?;

        let outcome = self
            .store
            .register_replica(NewReplica {
                name: name.to_string(),
                url: url.to_string(),
                health_check_endpoint: health_check_endpoint.to_string(),
            })
            .await?;
        let replica = outcome.replica;

        tracing::info!(
            caller = %caller,
            replica_id = replica.id,
            name = %replica.name,
            url = %replica.url,
            created = outcome.created,
            "Replica registered"
        );
        metrics::record_replica_transition(replica.status.as_str());

        self.audit(NewActivity::success(
            format!("Replica '{}' is ready to be active", replica.name),
            Some(replica.id),
        ))
        .await;

        let delivery = self
            .publisher
            .publish(&Command::AddReplica { name: replica.name.clone(), url: replica.url.clone() })
            .await;

        Ok(Applied { value: replica, delivery })
    }

    /// Mark a replica `disabled`. The row is kept.
    pub async fn disable(
        &self,
        caller: &CallerIdentity,
        selector: ReplicaSelector,
    ) -> AdminResult<Applied<Replica>> {
        let change = self
            .store
            .set_replica_status(&selector.key(), ReplicaStatus::Disabled)
            .await?;
        let replica = change.replica;

        tracing::info!(
            caller = %caller,
            replica_id = replica.id,
            previous = %change.previous,
            "Replica disabled"
        );
        metrics::record_replica_transition(ReplicaStatus::Disabled.as_str());

        self.audit(NewActivity::warning(
            format!("Replica '{}' is disabled", replica.name),
            Some(replica.id),
        ))
        .await;

        let delivery = self
            .publisher
            .publish(&Command::RemoveReplica { name: replica.name.clone(), url: replica.url.clone() })
            .await;

        Ok(Applied { value: replica, delivery })
    }

    /// Explicit status change along the allowed transitions.
    pub async fn set_status(
        &self,
        caller: &CallerIdentity,
        id: i64,
        status: &str,
    ) -> AdminResult<Applied<Replica>> {
        let next: ReplicaStatus = status
            .parse()
            .map_err(|e: crate::store::UnknownStatus| AdminError::Validation(e.to_string()))?;

        let current = self.by_id(id).await?;
        if current.status == next {
            return Ok(Applied { value: current, delivery: Delivery::NotRequired });
        }
        if !current.status.can_transition_to(next) {
            return Err(AdminError::validation(format!(
                "replica '{}' cannot change from {} to {}",
                current.name, current.status, next
            )));
        }

        let replica = self
            .store
            .compare_and_set_replica_status(id, current.status, next)
            .await?
            .ok_or_else(|| {
                AdminError::Conflict(format!(
                    "replica '{}' changed status concurrently",
                    current.name
                ))
            })?;

        tracing::info!(
            caller = %caller,
            replica_id = id,
            from = %current.status,
            to = %next,
            "Replica status changed"
        );
        metrics::record_replica_transition(next.as_str());

        if let Some(entry) = transition_activity(&replica, current.status, next) {
            self.audit(entry).await;
        }

        let command = match (current.status, next) {
            (_, ReplicaStatus::Active) => Some(Command::AddReplica {
                name: replica.name.clone(),
                url: replica.url.clone(),
            }),
            (ReplicaStatus::Active, _) => Some(Command::RemoveReplica {
                name: replica.name.clone(),
                url: replica.url.clone(),
            }),
            _ => None,
        };
        let delivery = match command {
            Some(command) => self.publisher.publish(&command).await,
            None => Delivery::NotRequired,
        };

        Ok(Applied { value: replica, delivery })
    }

    /// Apply a replica report from the proxy fleet. Unknown replicas are
    /// logged and ignored.
    pub async fn apply_fleet_report(
        &self,
        caller: &CallerIdentity,
        report: FleetReport,
        target: &ReplicaRef,
    ) -> AdminResult<Option<Replica>> {
        let Some(replica) = self.store.replica(&ReplicaKey::Url(target.url().to_string())).await? else {
            tracing::warn!(caller = %caller, url = %target.url(), report = ?report, "Fleet report for unknown replica dropped");
            return Ok(None);
        };

        let (next, entry) = match report {
            FleetReport::Added => (
                self.trust_replica_added.then_some(ReplicaStatus::Active),
                NewActivity::success(
                    format!("Replica '{}' was added to the proxy fleet", replica.name),
                    Some(replica.id),
                ),
            ),
            FleetReport::Failed => (
                Some(ReplicaStatus::Inactive),
                NewActivity::error(
                    format!("Replica '{}' failed in the proxy fleet", replica.name),
                    Some(replica.id),
                ),
            ),
            FleetReport::Removed => (
                Some(ReplicaStatus::Disabled),
                NewActivity::warning(
                    format!("Replica '{}' was removed from the proxy fleet", replica.name),
                    Some(replica.id),
                ),
            ),
        };

        let updated = match next {
            Some(status) => {
                let change = self
                    .store
                    .set_replica_status(&ReplicaKey::Id(replica.id), status)
                    .await?;
                tracing::info!(
                    caller = %caller,
                    replica_id = replica.id,
                    from = %change.previous,
                    to = %status,
                    "Replica status set by fleet report"
                );
                metrics::record_replica_transition(status.as_str());
                change.replica
            }
            None => {
                tracing::info!(caller = %caller, replica_id = replica.id, "Fleet acknowledged replica");
                replica
            }
        };

        self.audit(entry).await;
        Ok(Some(updated))
    }

    pub async fn by_id(&self, id: i64) -> AdminResult<Replica> {
        self.lookup(ReplicaKey::Id(id)).await
    }

    pub async fn by_url(&self, url: &str) -> AdminResult<Replica> {
        self.lookup(ReplicaKey::Url(url.to_string())).await
    }

    pub async fn by_name(&self, name: &str) -> AdminResult<Replica> {
        self.lookup(ReplicaKey::Name(name.to_string())).await
    }

    pub async fn list(&self) -> AdminResult<Vec<Replica>> {
        Ok(self.store.replicas().await?)
    }

    /// Audit trail, newest first.
    pub async fn activity(&self) -> AdminResult<Vec<ActivityLogEntry>> {
        Ok(self.store.activity().await?)
    }

    async fn lookup(&self, key: ReplicaKey) -> AdminResult<Replica> {
        self.store
            .replica(&key)
            .await?
            .ok_or_else(|| AdminError::not_found(key.to_string()))
    }

    // The mutation has already landed; a lost audit row is logged, not returned.
    async fn audit(&self, entry: NewActivity) {
        if let Err(e) = self.store.append_activity(entry).await {
            tracing::error!(error = %e, "Failed to append activity log entry");
        }
    }
}

fn transition_activity(
    replica: &Replica,
    from: ReplicaStatus,
    to: ReplicaStatus,
) -> Option<NewActivity> {
    use ReplicaStatus::*;
    let name = &replica.name;
    let id = Some(replica.id);
    match (from, to) {
        (Active, Disabled) => Some(NewActivity::warning(format!("Replica '{}' is deactivated", name), id)),
        (Disabled, Active) => Some(NewActivity::success(
            format!("Replica '{}' is queued for activation", name),
            id,
        )),
        (Inactive, Active) => Some(NewActivity::success(
            format!("Replica '{}' is activated and running", name),
            id,
        )),
        (Active, Inactive) => Some(NewActivity::warning(format!("Replica '{}' is marked inactive", name), id)),
        _ => None,
    }
}
