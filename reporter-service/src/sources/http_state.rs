use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::InMemoryStateStore;
use crate::pipeline::PipelineError;

#[derive(Clone)]
struct ApiState {
    store: Arc<InMemoryStateStore>,
    auth_bearer_token: Option<Arc<str>>,
}

impl ApiState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.auth_bearer_token else {
            return true;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == &**expected)
    }
}

#[derive(Deserialize)]
struct StateUpdate {
    state: serde_json::Value,
}

#[derive(Serialize)]
struct StateView {
    entity_id: String,
    state: String,
}

/// HTTP endpoint through which the host pushes entity states into the store.
///
/// - `PUT /states/{entity_id}` with `{"state": "1234.6"}` (a JSON number works too, `null` clears)
/// - `DELETE /states/{entity_id}`
/// - `GET /states/{entity_id}`
pub struct HttpStateApi {
    local_addr: SocketAddr,
}

impl HttpStateApi {
    pub async fn new(
        bind_addr: &str,
        store: Arc<InMemoryStateStore>,
        auth_bearer_token: Option<String>,
    ) -> Result<Self, PipelineError> {
        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| PipelineError::Source(format!("invalid bind addr: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| PipelineError::Source(format!("failed to bind state API listener: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| PipelineError::Source(format!("state API listener has no address: {e}")))?;

        let app = router(ApiState {
            store,
            auth_bearer_token: auth_bearer_token.map(Arc::from),
        });

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                tracing::error!(error = %e, "state API server error");
            }
        });

        Ok(Self { local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn router(state: ApiState) -> Router {
    Router::new()
        .route("/states/:entity_id", get(get_state).put(put_state).delete(delete_state))
        .with_state(state)
}

async fn put_state(
    State(api): State<ApiState>,
    Path(entity_id): Path<String>,
    headers: HeaderMap,
    Json(update): Json<StateUpdate>,
) -> StatusCode {
    if !api.authorized(&headers) {
        metrics::counter!("state_api_unauthorized_total").increment(1);
        return StatusCode::UNAUTHORIZED;
    }

    api.store.apply(&entity_id, &update.state);
    metrics::counter!("state_api_updates_total").increment(1);
    tracing::trace!(entity_id = %entity_id, state = %update.state, "state updated");
    StatusCode::NO_CONTENT
}

async fn delete_state(
    State(api): State<ApiState>,
    Path(entity_id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    if !api.authorized(&headers) {
        metrics::counter!("state_api_unauthorized_total").increment(1);
        return StatusCode::UNAUTHORIZED;
    }

    match api.store.remove(&entity_id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn get_state(
    State(api): State<ApiState>,
    Path(entity_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StateView>, StatusCode> {
    if !api.authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let state = api.store.get(&entity_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(StateView { entity_id, state }))
}
