//! Versioned prequal parameters with staged activation.

use std::sync::Arc;

use crate::error::{AdminError, AdminResult};
use crate::messaging::envelope::Command;
use crate::messaging::publisher::{Applied, CommandPublisher};
use crate::security::CallerIdentity;
use crate::store::{Activation, NewActivity, ParameterSet, ParameterVersion, Store};

/// The proxy fleet's answer to a `new-parameters` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterAck {
    Applied { fields: Vec<String> },
    Failed { error: String },
}

pub struct ParameterManager {
    store: Arc<dyn Store>,
    publisher: Arc<CommandPublisher>,
}

impl ParameterManager {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<CommandPublisher>) -> Self {
        Self { store, publisher }
    }

    /// The version governing the fleet: the newest one if it is active,
    /// otherwise the most recent active one.
    pub async fn effective(&self) -> AdminResult<ParameterVersion> {
        let latest = self
            .store
            .latest_parameters()
            .await?
            .ok_or_else(|| AdminError::not_found("prequal parameters"))?;

        if latest.is_active() {
            return Ok(latest);
        }

        self.store
            .latest_active_parameters()
            .await?
            .ok_or_else(|| AdminError::not_found("active prequal parameters"))
    }

    /// Insert a version, optionally activating `activate_id`, and announce it.
    pub async fn add(
        &self,
        caller: &CallerIdentity,
        params: ParameterSet,
        activate_id: Option<i64>,
    ) -> AdminResult<Applied<ParameterVersion>> {
        validate(&params)?;

        let activation = match activate_id {
            Some(id) => Activation::Explicit(id),
            None => Activation::IfFirst,
        };
        let inserted = self.store.insert_parameters(params, activation).await?;

        let activated = match activation {
            Activation::Explicit(id) => Some(id),
            Activation::IfFirst => inserted.is_active().then_some(inserted.id),
        };

        tracing::info!(
            caller = %caller,
            version = inserted.id,
            activated = ?activated,
            "Prequal parameters stored"
        );

        let mut message = format!(
            "Prequal parameters updated (version {}): {}",
            inserted.id,
            describe(&inserted.params)
        );
        if let Some(id) = activated {
            message.push_str(&format!("; activated version {}", id));
        }
        if let Err(e) = self.store.append_activity(NewActivity::success(message, None)).await {
            tracing::error!(error = %e, "Failed to append activity log entry");
        }

        let delivery = self
            .publisher
            .publish(&Command::NewParameters { data: inserted.clone(), activate_id })
            .await;

        Ok(Applied { value: inserted, delivery })
    }

    /// Every version, newest first.
    pub async fn versions(&self) -> AdminResult<Vec<ParameterVersion>> {
        Ok(self.store.parameter_versions().await?)
    }

    pub async fn record_fleet_ack(&self, caller: &CallerIdentity, ack: ParameterAck) -> AdminResult<()> {
        let entry = match &ack {
            ParameterAck::Applied { fields } => {
                tracing::info!(caller = %caller, fields = ?fields, "Proxy fleet applied prequal parameters");
                NewActivity::success(
                    format!("Proxy fleet applied prequal parameters: {}", fields.join(", ")),
                    None,
                )
            }
            ParameterAck::Failed { error } => {
                tracing::warn!(caller = %caller, error = %error, "Proxy fleet failed to apply prequal parameters");
                NewActivity::error(
                    format!("Proxy fleet failed to apply prequal parameters: {}", error),
                    None,
                )
            }
        };
        self.store.append_activity(entry).await?;
        Ok(())
    }
}

fn describe(params: &ParameterSet) -> String {
    format!(
        "max_life_time={}, pool_size={}, probe_factor={}, probe_remove_factor={}, mu={}",
        params.max_life_time, params.pool_size, params.probe_factor, params.probe_remove_factor, params.mu
    )
}

/// Range checks applied before a version is stored.
pub fn validate(params: &ParameterSet) -> AdminResult<()> {
    let mut problems = Vec::new();
    if params.max_life_time <= 0 {
        problems.push("max_life_time must be greater than 0");
    }
    if params.pool_size <= 10 {
        problems.push("pool_size must be greater than 10");
    }
    if params.probe_factor.is_nan() || params.probe_factor <= 0.0 {
        problems.push("probe_factor must be greater than 0");
    }
    if params.probe_remove_factor <= 0 {
        problems.push("probe_remove_factor must be greater than 0");
    }
    if params.mu <= 0 {
        problems.push("mu must be greater than 0");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AdminError::Validation(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::broker::MemoryBroker;
    use crate::store::{ActivityType, MemoryStore, ParameterStatus, SqliteStore};

    fn params(pool_size: i64) -> ParameterSet {
        ParameterSet {
            max_life_time: 30,
            pool_size,
            probe_factor: 1.5,
            probe_remove_factor: 2,
            mu: 1,
        }
    }

    fn manager() -> (ParameterManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let broker = Arc::new(MemoryBroker::new(64));
        let publisher = Arc::new(CommandPublisher::new(broker, "out"));
        (ParameterManager::new(store.clone(), publisher), store)
    }

    fn caller() -> CallerIdentity {
        CallerIdentity::new("admin")
    }

    /// Races `count` adds from separate tasks and returns what they stored.
    async fn add_concurrently(
        manager: &Arc<ParameterManager>,
        count: i64,
        activate: impl Fn(i64) -> Option<i64>,
    ) -> Vec<ParameterVersion> {
        let tasks: Vec<_> = (0..count)
            .map(|i| {
                let manager = manager.clone();
                let target = activate(i);
                tokio::spawn(async move { manager.add(&caller(), params(11 + i), target).await })
            })
            .collect();

        let mut stored = Vec::new();
        for task in tasks {
            stored.push(task.await.unwrap().unwrap().value);
        }
        stored
    }

    async fn assert_single_active_under_concurrent_adds(store: Arc<dyn Store>) {
        let broker = Arc::new(MemoryBroker::new(256));
        let publisher = Arc::new(CommandPublisher::new(broker, "out"));
        let manager = Arc::new(ParameterManager::new(store.clone(), publisher));

        let first_wave = add_concurrently(&manager, 16, |_| None).await;
        assert_eq!(first_wave.iter().filter(|v| v.is_active()).count(), 1);
        assert_eq!(active_count(&store.parameter_versions().await.unwrap()), 1);

        let ids: Vec<i64> = first_wave.iter().map(|v| v.id).collect();
        add_concurrently(&manager, 16, |i| Some(ids[i as usize % ids.len()])).await;

        let versions = store.parameter_versions().await.unwrap();
        assert_eq!(versions.len(), 32);
        assert_eq!(active_count(&versions), 1);
        assert!(ids.contains(&manager.effective().await.unwrap().id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_keep_one_active_in_memory() {
        assert_single_active_under_concurrent_adds(Arc::new(MemoryStore::new())).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_keep_one_active_in_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("params.db")).unwrap();
        assert_single_active_under_concurrent_adds(Arc::new(store)).await;
    }

    fn active_count(versions: &[ParameterVersion]) -> usize {
        versions.iter().filter(|v| v.is_active()).count()
    }

    #[tokio::test]
    async fn test_first_version_is_auto_activated() {
        let (manager, store) = manager();
        let first = manager.add(&caller(), params(16), None).await.unwrap().value;
        assert_eq!(first.status, ParameterStatus::Active);

        let log = store.activity().await.unwrap();
        assert_eq!(
            log[0].message,
            format!(
                "Prequal parameters updated (version {}): max_life_time=30, pool_size=16, probe_factor=1.5, probe_remove_factor=2, mu=1; activated version {}",
                first.id, first.id
            )
        );
    }

    #[tokio::test]
    async fn test_effective_falls_back_to_active_version() {
        let (manager, _) = manager();
        let first = manager.add(&caller(), params(16), None).await.unwrap().value;
        let staged = manager.add(&caller(), params(20), None).await.unwrap().value;
        assert_eq!(staged.status, ParameterStatus::Inactive);

        let effective = manager.effective().await.unwrap();
        assert_eq!(effective.id, first.id);

        manager.add(&caller(), params(24), Some(staged.id)).await.unwrap();
        let effective = manager.effective().await.unwrap();
        assert_eq!(effective.id, staged.id);
    }

    #[tokio::test]
    async fn test_at_most_one_active_after_every_add() {
        let (manager, _) = manager();
        let mut ids = Vec::new();
        for (i, activate) in [None, None, Some(0), None, Some(2), Some(1)].into_iter().enumerate() {
            let activate_id = activate.map(|idx: usize| ids[idx]);
            let v = manager.add(&caller(), params(11 + i as i64), activate_id).await.unwrap().value;
            ids.push(v.id);
            assert_eq!(active_count(&manager.versions().await.unwrap()), 1);
        }
    }

    #[tokio::test]
    async fn test_activate_unknown_version_inserts_nothing() {
        let (manager, _) = manager();
        manager.add(&caller(), params(16), None).await.unwrap();
        let err = manager.add(&caller(), params(16), Some(404)).await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound(_)));
        assert_eq!(manager.versions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let (manager, _) = manager();
        let err = manager.add(&caller(), params(10), None).await.unwrap_err();
        assert!(err.to_string().contains("pool_size must be greater than 10"));

        let mut bad = params(16);
        bad.probe_factor = 0.0;
        bad.mu = -1;
        let err = validate(&bad).unwrap_err();
        assert!(err.to_string().contains("probe_factor"));
        assert!(err.to_string().contains("mu"));
    }

    #[tokio::test]
    async fn test_effective_without_versions() {
        let (manager, _) = manager();
        assert!(matches!(manager.effective().await, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fleet_acks_are_audited() {
        let (manager, store) = manager();
        let fleet = CallerIdentity::proxy_fleet();
        manager
            .record_fleet_ack(&fleet, ParameterAck::Applied { fields: vec!["pool_size".into(), "mu".into()] })
            .await
            .unwrap();
        manager
            .record_fleet_ack(&fleet, ParameterAck::Failed { error: "bad mu".into() })
            .await
            .unwrap();

        let log = store.activity().await.unwrap();
        assert_eq!(log[0].activity_type, ActivityType::Error);
        assert_eq!(log[0].message, "Proxy fleet failed to apply prequal parameters: bad mu");
        assert_eq!(log[1].message, "Proxy fleet applied prequal parameters: pool_size, mu");
        assert!(manager.versions().await.unwrap().is_empty());
    }
}
