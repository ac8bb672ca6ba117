//! Module reference routes: `/api/modules/*`

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;

use nxdocs_storage::Module;

use crate::error::ApiError;
use crate::normalize::ApiJson;
use crate::state::AppState;

const FETCH_MODULES_FAILED: &str = "Failed to fetch modules";
const FETCH_MODULE_FAILED: &str = "Failed to fetch module";

/// Build the `/api/modules` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_modules))
        .route("/{protocol}", get(list_protocol_modules))
        .route("/{protocol}/{name}", get(get_module))
}

/// List every module.
async fn list_modules(
    State(state): State<Arc<AppState>>,
) -> Result<ApiJson<Vec<Module>>, ApiError> {
    let modules = state
        .storage
        .list_modules()
        .await
        .map_err(ApiError::internal(FETCH_MODULES_FAILED))?;

    Ok(ApiJson::new(modules, FETCH_MODULES_FAILED))
}

/// List the modules of one protocol. Unknown protocols yield `[]`.
async fn list_protocol_modules(
    State(state): State<Arc<AppState>>,
    Path(protocol): Path<String>,
) -> Result<ApiJson<Vec<Module>>, ApiError> {
    let modules = state
        .storage
        .list_modules_by_protocol(&protocol)
        .await
        .map_err(ApiError::internal(FETCH_MODULES_FAILED))?;

    Ok(ApiJson::new(modules, FETCH_MODULES_FAILED))
}

async fn get_module(
    State(state): State<Arc<AppState>>,
    Path((protocol, name)): Path<(String, String)>,
) -> Result<ApiJson<Module>, ApiError> {
    let module = state
        .storage
        .get_module(&protocol, &name)
        .await
        .map_err(ApiError::internal(FETCH_MODULE_FAILED))?
        .ok_or(ApiError::NotFound("Module not found"))?;

    Ok(ApiJson::new(module, FETCH_MODULE_FAILED))
}
