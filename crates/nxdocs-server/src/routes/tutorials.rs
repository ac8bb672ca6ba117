//! Tutorial routes: `/api/tutorials/*`

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;

use nxdocs_storage::Tutorial;

use crate::error::ApiError;
use crate::normalize::ApiJson;
use crate::state::AppState;

const FETCH_TUTORIALS_FAILED: &str = "Failed to fetch tutorials";
const FETCH_TUTORIAL_FAILED: &str = "Failed to fetch tutorial";

/// Build the `/api/tutorials` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tutorials))
        .route("/{slug}", get(get_tutorial))
}

async fn list_tutorials(
    State(state): State<Arc<AppState>>,
) -> Result<ApiJson<Vec<Tutorial>>, ApiError> {
    let tutorials = state
        .storage
        .list_tutorials()
        .await
        .map_err(ApiError::internal(FETCH_TUTORIALS_FAILED))?;

    Ok(ApiJson::new(tutorials, FETCH_TUTORIALS_FAILED))
}

/// Fetch a tutorial by its slug.
async fn get_tutorial(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<ApiJson<Tutorial>, ApiError> {
    let tutorial = state
        .storage
        .get_tutorial(&slug)
        .await
        .map_err(ApiError::internal(FETCH_TUTORIAL_FAILED))?
        .ok_or(ApiError::NotFound("Tutorial not found"))?;

    Ok(ApiJson::new(tutorial, FETCH_TUTORIAL_FAILED))
}
