use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::http::response::unauthorized;
use crate::http::server::AppState;

/// Resolve the bearer key to a `CallerIdentity` extension or reject with 401.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match state.api_keys.authenticate(auth_header) {
        Some(caller) => {
            tracing::debug!(caller = %caller, path = %request.uri().path(), "Authenticated");
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated admin request");
            unauthorized()
        }
    }
}
