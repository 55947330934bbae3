use axum::{
    extract::{rejection::JsonRejection, Query, State, WebSocketUpgrade},
    response::Response,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AdminError, AdminResult};
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::messaging::Applied;
use crate::replicas::ReplicaSelector;
use crate::security::CallerIdentity;
use crate::statistics::StatisticsSummary;
use crate::store::{ActivityLogEntry, ParameterSet, ParameterVersion, Replica};

type ApiResult<T> = AdminResult<Json<ApiResponse<T>>>;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddReplicaRequest {
    pub name: String,
    pub url: String,
    pub health_check_endpoint: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplicaQuery {
    pub id: Option<i64>,
    pub url: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub id: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateParametersRequest {
    #[serde(flatten)]
    pub params: ParameterSet,
    #[serde(default)]
    pub activate_id: Option<i64>,
}

/// `get-replica` answers with one replica when a selector is given, all otherwise.
#[derive(Serialize)]
#[serde(untagged)]
pub enum ReplicaLookup {
    One(Replica),
    All(Vec<Replica>),
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn add_replica(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<AddReplicaRequest>, JsonRejection>,
) -> ApiResult<Applied<Replica>> {
    let Json(req) = payload?;
    let applied = state
        .replicas
        .register(&caller, &req.name, &req.url, &req.health_check_endpoint)
        .await?;
    Ok(ApiResponse::ok_with_message(
        format!("Replica '{}' registered", applied.value.name),
        applied,
    ))
}

pub async fn get_replica(
    State(state): State<AppState>,
    Query(query): Query<ReplicaQuery>,
) -> ApiResult<ReplicaLookup> {
    let lookup = match (query.id, query.url, query.name) {
        (Some(id), _, _) => ReplicaLookup::One(state.replicas.by_id(id).await?),
        (None, Some(url), _) => ReplicaLookup::One(state.replicas.by_url(&url).await?),
        (None, None, Some(name)) => ReplicaLookup::One(state.replicas.by_name(&name).await?),
        (None, None, None) => ReplicaLookup::All(state.replicas.list().await?),
    };
    Ok(ApiResponse::ok(lookup))
}

pub async fn remove_replica(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<ReplicaQuery>,
) -> ApiResult<Applied<Replica>> {
    let selector = ReplicaSelector::from_parts(query.id, query.url)?;
    let applied = state.replicas.disable(&caller, selector).await?;
    Ok(ApiResponse::ok_with_message(
        format!("Replica '{}' is disabled", applied.value.name),
        applied,
    ))
}

pub async fn change_status(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> ApiResult<Applied<Replica>> {
    let Json(req) = payload?;
    let applied = state.replicas.set_status(&caller, req.id, &req.status).await?;
    Ok(ApiResponse::ok(applied))
}

pub async fn activity_logs(State(state): State<AppState>) -> ApiResult<Vec<ActivityLogEntry>> {
    Ok(ApiResponse::ok(state.replicas.activity().await?))
}

pub async fn update_prequal_parameters(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<UpdateParametersRequest>, JsonRejection>,
) -> ApiResult<Applied<ParameterVersion>> {
    let Json(req) = payload?;
    let applied = state.parameters.add(&caller, req.params, req.activate_id).await?;
    Ok(ApiResponse::ok_with_message(
        format!("Prequal parameters stored as version {}", applied.value.id),
        applied,
    ))
}

pub async fn get_prequal_parameters(State(state): State<AppState>) -> ApiResult<ParameterVersion> {
    Ok(ApiResponse::ok(state.parameters.effective().await?))
}

pub async fn get_prequal_parameter_history(
    State(state): State<AppState>,
) -> ApiResult<Vec<ParameterVersion>> {
    Ok(ApiResponse::ok(state.parameters.versions().await?))
}

pub async fn get_statistics(State(state): State<AppState>) -> ApiResult<StatisticsSummary> {
    Ok(ApiResponse::ok(state.statistics.summary().await?))
}

pub async fn fleet_connect(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ws: WebSocketUpgrade,
) -> Response {
    let bridge = state.bridge.clone();
    ws.on_upgrade(move |socket| bridge.serve(socket, caller))
}

impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        AdminError::Validation(rejection.body_text())
    }
}
