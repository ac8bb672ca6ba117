//! Protocol catalogue route: `/api/protocols`

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;

use nxdocs_storage::Protocol;

use crate::error::ApiError;
use crate::normalize::ApiJson;
use crate::state::AppState;

const FETCH_PROTOCOLS_FAILED: &str = "Failed to fetch protocols";

/// Build the `/api/protocols` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_protocols))
}

async fn list_protocols(
    State(state): State<Arc<AppState>>,
) -> Result<ApiJson<Vec<Protocol>>, ApiError> {
    let protocols = state
        .storage
        .list_protocols()
        .await
        .map_err(ApiError::internal(FETCH_PROTOCOLS_FAILED))?;

    Ok(ApiJson::new(protocols, FETCH_PROTOCOLS_FAILED))
}
