//! Admin API routes.
//!
//! Every route sits behind bearer-key authentication; handlers receive the
//! resolved `CallerIdentity` as a request extension.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/add-replica", post(add_replica))
        .route("/admin/get-replica", get(get_replica))
        .route("/admin/remove-replica", delete(remove_replica))
        .route("/admin/change-status", patch(change_status))
        .route("/admin/activity-logs", get(activity_logs))
        .route("/admin/update-prequal-parameters", post(update_prequal_parameters))
        .route("/admin/get-prequal-parameters", get(get_prequal_parameters))
        .route("/admin/get-prequal-parameter-history", get(get_prequal_parameter_history))
        .route("/admin/get-statistics", get(get_statistics))
        .route("/fleet/connect", get(fleet_connect))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
