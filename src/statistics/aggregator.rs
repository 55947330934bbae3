//! Batch accumulation of per-URL request counters.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AdminError, AdminResult};
use crate::observability::metrics;
use crate::store::{StatisticsDelta, StatisticsRecord, Store};

/// Fleet-wide totals plus the per-URL records they were summed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsSummary {
    pub total_successful_requests: u64,
    pub total_failed_requests: u64,
    pub replicas: Vec<StatisticsRecord>,
}

pub struct StatisticsAggregator {
    store: Arc<dyn Store>,
}

impl StatisticsAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add a batch of deltas. Returns the updated records.
    pub async fn accumulate(&self, batch: &[StatisticsDelta]) -> AdminResult<Vec<StatisticsRecord>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(position) = batch.iter().position(|d| d.url.trim().is_empty()) {
            return Err(AdminError::validation(format!(
                "statistics record {} has an empty url",
                position
            )));
        }

        let records = self.store.accumulate_statistics(batch).await?;
        metrics::record_statistics_records(records.len());
        tracing::debug!(records = records.len(), "Statistics batch accumulated");
        Ok(records)
    }

    pub async fn records(&self) -> AdminResult<Vec<StatisticsRecord>> {
        Ok(self.store.statistics().await?)
    }

    pub async fn summary(&self) -> AdminResult<StatisticsSummary> {
        let replicas = self.records().await?;
        let total_successful_requests = replicas
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.successful_requests));
        let total_failed_requests = replicas
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.failed_requests));

        Ok(StatisticsSummary { total_successful_requests, total_failed_requests, replicas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn delta(url: &str, ok: u64, failed: u64) -> StatisticsDelta {
        StatisticsDelta { url: url.into(), successful_requests: ok, failed_requests: failed }
    }

    #[tokio::test]
    async fn test_accumulates_instead_of_overwriting() {
        let aggregator = StatisticsAggregator::new(Arc::new(MemoryStore::new()));
        aggregator.accumulate(&[delta("A", 5, 1)]).await.unwrap();
        let records = aggregator.accumulate(&[delta("A", 3, 2)]).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].successful_requests, 8);
        assert_eq!(records[0].failed_requests, 3);
    }

    #[tokio::test]
    async fn test_empty_url_aborts_batch() {
        let aggregator = StatisticsAggregator::new(Arc::new(MemoryStore::new()));
        let err = aggregator
            .accumulate(&[delta("A", 1, 0), delta("", 1, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
        assert!(aggregator.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let aggregator = StatisticsAggregator::new(Arc::new(MemoryStore::new()));
        assert!(aggregator.accumulate(&[]).await.unwrap().is_empty());
        aggregator
            .accumulate(&[delta("A", 5, 1), delta("B", 7, 0)])
            .await
            .unwrap();

        let summary = aggregator.summary().await.unwrap();
        assert_eq!(summary.total_successful_requests, 12);
        assert_eq!(summary.total_failed_requests, 1);
        assert_eq!(summary.replicas.len(), 2);
    }
}
