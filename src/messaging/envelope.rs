//! The `{name, body}` message contract between the control plane and the proxy fleet.
//!
//! Outbound commands serialize straight from [`Command`]. Inbound payloads go
//! through [`decode_event`], which splits the envelope first so an unknown
//! `name` and a bad body for a known `name` are reported differently.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::store::{ParameterVersion, StatisticsDelta};

/// Commands published on the outbound queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "body", rename_all = "kebab-case")]
pub enum Command {
    AddReplica {
        name: String,
        url: String,
    },
    RemoveReplica {
        name: String,
        url: String,
    },
    NewParameters {
        data: ParameterVersion,
        #[serde(skip_serializing_if = "Option::is_none")]
        activate_id: Option<i64>,
    },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::AddReplica { .. } => "add-replica",
            Command::RemoveReplica { .. } => "remove-replica",
            Command::NewParameters { .. } => "new-parameters",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A replica named by an inbound event: a bare URL string or `{name, url}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplicaRef {
    Url(String),
    Named {
        #[serde(default)]
        name: Option<String>,
        url: String,
    },
}

impl ReplicaRef {
    pub fn url(&self) -> &str {
        match self {
            ReplicaRef::Url(url) => url,
            ReplicaRef::Named { url, .. } => url,
        }
    }
}

/// Request counters carried by a `statistics` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCounts {
    pub successful_requests: u64,
    pub failed_requests: u64,
}

/// One entry of a `statistics` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsReport {
    #[serde(alias = "url")]
    pub replica_name: String,
    pub statistics: RequestCounts,
}

impl From<StatisticsReport> for StatisticsDelta {
    fn from(report: StatisticsReport) -> Self {
        StatisticsDelta {
            url: report.replica_name,
            successful_requests: report.statistics.successful_requests,
            failed_requests: report.statistics.failed_requests,
        }
    }
}

/// Events received on the inbound queue, one variant per `name`.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ReplicaAdded(ReplicaRef),
    ReplicaFailed(ReplicaRef),
    ReplicaRemoved(ReplicaRef),
    ParametersUpdated { fields: Vec<String> },
    ParametersUpdateFailed { error: String },
    Statistics(Vec<StatisticsReport>),
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::ReplicaAdded(_) => "replica-added",
            InboundEvent::ReplicaFailed(_) => "replica-failed",
            InboundEvent::ReplicaRemoved(_) => "replica-removed",
            InboundEvent::ParametersUpdated { .. } => "parameters-updated",
            InboundEvent::ParametersUpdateFailed { .. } => "parameters-update-failed",
            InboundEvent::Statistics(_) => "statistics",
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unrecognized event '{0}'")]
    UnknownKind(String),

    #[error("invalid body for '{kind}': {source}")]
    InvalidBody {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawEnvelope {
    name: String,
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct FieldsBody {
    fields: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

fn body<T: serde::de::DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::InvalidBody { kind, source })
}

/// Decode one raw inbound payload.
pub fn decode_event(payload: &[u8]) -> Result<InboundEvent, DecodeError> {
    let raw: RawEnvelope = serde_json::from_slice(payload).map_err(DecodeError::Malformed)?;

    let event = match raw.name.as_str() {
        "replica-added" => InboundEvent::ReplicaAdded(body("replica-added", raw.body)?),
        "replica-failed" => InboundEvent::ReplicaFailed(body("replica-failed", raw.body)?),
        "replica-removed" => InboundEvent::ReplicaRemoved(body("replica-removed", raw.body)?),
        "parameters-updated" => {
            let FieldsBody { fields } = body("parameters-updated", raw.body)?;
            InboundEvent::ParametersUpdated { fields }
        }
        "parameters-update-failed" => {
            let ErrorBody { error } = body("parameters-update-failed", raw.body)?;
            InboundEvent::ParametersUpdateFailed { error }
        }
        "statistics" => InboundEvent::Statistics(body("statistics", raw.body)?),
        _ => return Err(DecodeError::UnknownKind(raw.name)),
    };

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ParameterSet, ParameterStatus};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        let cmd = Command::AddReplica { name: "r1".into(), url: "http://10.0.0.1:3000".into() };
        let json: Value = serde_json::from_slice(&cmd.encode().unwrap()).unwrap();
        assert_eq!(json, json!({"name": "add-replica", "body": {"name": "r1", "url": "http://10.0.0.1:3000"}}));
    }

    #[test]
    fn test_new_parameters_omits_missing_activate_id() {
        let cmd = Command::NewParameters {
            data: ParameterVersion {
                id: 2,
                params: ParameterSet {
                    max_life_time: 30,
                    pool_size: 16,
                    probe_factor: 1.5,
                    probe_remove_factor: 2,
                    mu: 1,
                },
                status: ParameterStatus::Inactive,
                created_at: Utc::now(),
            },
            activate_id: None,
        };
        let json: Value = serde_json::from_slice(&cmd.encode().unwrap()).unwrap();
        assert_eq!(json["name"], "new-parameters");
        assert_eq!(json["body"]["data"]["pool_size"], 16);
        assert!(json["body"].get("activate_id").is_none());
    }

    #[test]
    fn test_replica_ref_accepts_both_shapes() {
        let bare = decode_event(br#"{"name":"replica-failed","body":"http://a:1"}"#).unwrap();
        assert_eq!(bare, InboundEvent::ReplicaFailed(ReplicaRef::Url("http://a:1".into())));

        let named = decode_event(br#"{"name":"replica-removed","body":{"name":"a","url":"http://a:1"}}"#).unwrap();
        match named {
            InboundEvent::ReplicaRemoved(r) => assert_eq!(r.url(), "http://a:1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_statistics_accepts_url_alias() {
        let event = decode_event(
            br#"{"name":"statistics","body":[
                {"replica_name":"http://a:1","statistics":{"successful_requests":5,"failed_requests":1}},
                {"url":"http://b:1","statistics":{"successful_requests":0,"failed_requests":2}}
            ]}"#,
        )
        .unwrap();
        let InboundEvent::Statistics(reports) = event else { panic!("expected statistics") };
        let deltas: Vec<StatisticsDelta> = reports.into_iter().map(Into::into).collect();
        assert_eq!(deltas[0].url, "http://a:1");
        assert_eq!(deltas[1].failed_requests, 2);
    }

    #[test]
    fn test_decode_failures_are_classified() {
        assert!(matches!(decode_event(b"not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(
            decode_event(br#"{"name":"reboot","body":{}}"#),
            Err(DecodeError::UnknownKind(k)) if k == "reboot"
        ));
        assert!(matches!(
            decode_event(br#"{"name":"parameters-update-failed","body":{"reason":"x"}}"#),
            Err(DecodeError::InvalidBody { kind: "parameters-update-failed", .. })
        ));
    }
}
