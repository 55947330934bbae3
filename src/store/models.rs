//! Records persisted by the control plane.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Membership status of a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaStatus {
    /// Registered but not yet confirmed healthy.
    Inactive,
    /// Confirmed serving.
    Active,
    /// Removed from rotation.
    Disabled,
}

/// A status string outside `inactive`, `active`, `disabled`.
#[derive(Debug, Clone, Error)]
#[error("invalid status '{0}'. Allowed values are 'active', 'inactive', or 'disabled'")]
pub struct UnknownStatus(pub String);

impl ReplicaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaStatus::Inactive => "inactive",
            ReplicaStatus::Active => "active",
            ReplicaStatus::Disabled => "disabled",
        }
    }

    /// Whether an explicit status change may move a replica from `self` to `next`.
    ///
    /// `disabled` is only entered from `active` and only left towards `active`.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(self, next: ReplicaStatus) -> bool {
        use ReplicaStatus::*;
        matches!(
            (self, next),
            (Inactive, Inactive)
                | (Active, Active)
                | (Disabled, Disabled)
                | (Inactive, Active)
                | (Active, Inactive)
                | (Active, Disabled)
                | (Disabled, Active)
        )
    }
}

impl fmt::Display for ReplicaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplicaStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(ReplicaStatus::Inactive),
            "active" => Ok(ReplicaStatus::Active),
            "disabled" => Ok(ReplicaStatus::Disabled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A backend server registered with the proxy fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub health_check_endpoint: String,
    pub status: ReplicaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReplica {
    pub name: String,
    pub url: String,
    pub health_check_endpoint: String,
}

/// Selector for a single replica row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaKey {
    Id(i64),
    Url(String),
    Name(String),
}

impl fmt::Display for ReplicaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicaKey::Id(id) => write!(f, "replica with id {}", id),
            ReplicaKey::Url(url) => write!(f, "replica with url '{}'", url),
            ReplicaKey::Name(name) => write!(f, "replica named '{}'", name),
        }
    }
}

/// Result of the idempotent register upsert.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub replica: Replica,
    /// False when an existing (name, url) row was refreshed instead.
    pub created: bool,
}

/// Result of an unconditional status write.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub previous: ReplicaStatus,
    pub replica: Replica,
}

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Success,
    Warning,
    Error,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Success => "success",
            ActivityType::Warning => "warning",
            ActivityType::Error => "error",
        }
    }
}

impl FromStr for ActivityType {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ActivityType::Success),
            "warning" => Ok(ActivityType::Warning),
            "error" => Ok(ActivityType::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub message: String,
    pub replica_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An audit record before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub message: String,
    pub replica_id: Option<i64>,
}

impl NewActivity {
    pub fn success(message: impl Into<String>, replica_id: Option<i64>) -> Self {
        Self { activity_type: ActivityType::Success, message: message.into(), replica_id }
    }

    pub fn warning(message: impl Into<String>, replica_id: Option<i64>) -> Self {
        Self { activity_type: ActivityType::Warning, message: message.into(), replica_id }
    }

    pub fn error(message: impl Into<String>, replica_id: Option<i64>) -> Self {
        Self { activity_type: ActivityType::Error, message: message.into(), replica_id }
    }
}

/// Activation flag of a parameter version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    Active,
    Inactive,
}

impl ParameterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStatus::Active => "active",
            ParameterStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ParameterStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ParameterStatus::Active),
            "inactive" => Ok(ParameterStatus::Inactive),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Prequal probe tuning values consumed by the proxy fleet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub max_life_time: i64,
    pub pool_size: i64,
    pub probe_factor: f64,
    pub probe_remove_factor: i64,
    pub mu: i64,
}

/// A stored, versioned parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVersion {
    pub id: i64,
    #[serde(flatten)]
    pub params: ParameterSet,
    pub status: ParameterStatus,
    pub created_at: DateTime<Utc>,
}

impl ParameterVersion {
    pub fn is_active(&self) -> bool {
        self.status == ParameterStatus::Active
    }
}

/// How `insert_parameters` settles the single active version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Activate this existing version and demote every other one.
    Explicit(i64),
    /// Activate the inserted row only if the table was empty.
    IfFirst,
}

/// Counters reported by the proxy fleet for one URL since its last report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsDelta {
    pub url: String,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

/// Cumulative counters for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub url: String,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
