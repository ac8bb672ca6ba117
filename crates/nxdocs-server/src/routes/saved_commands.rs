//! Saved command routes: `/api/saved-commands/*`
//!
//! List, create, and delete commands saved from the builder.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use nxdocs_storage::{NewSavedCommand, SavedCommand};

use crate::error::ApiError;
use crate::normalize::ApiJson;
use crate::state::AppState;

const FETCH_FAILED: &str = "Failed to fetch saved commands";
const SAVE_FAILED: &str = "Failed to save command";
const DELETE_FAILED: &str = "Failed to delete command";

/// Build the `/api/saved-commands` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_saved_commands).post(create_saved_command))
        .route("/{id}", delete(delete_saved_command))
}

async fn list_saved_commands(
    State(state): State<Arc<AppState>>,
) -> Result<ApiJson<Vec<SavedCommand>>, ApiError> {
    let commands = state
        .storage
        .list_saved_commands()
        .await
        .map_err(ApiError::internal(FETCH_FAILED))?;

    Ok(ApiJson::new(commands, FETCH_FAILED))
}

/// Store a new command. A body that is not a saved command is reported as
/// the same failure as a storage error.
async fn create_saved_command(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewSavedCommand>, JsonRejection>,
) -> Result<(StatusCode, ApiJson<SavedCommand>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::Internal {
        message: SAVE_FAILED,
        cause: rejection.body_text(),
    })?;

    let command = state
        .storage
        .create_saved_command(body)
        .await
        .map_err(ApiError::internal(SAVE_FAILED))?;

    tracing::info!(id = command.id, name = %command.name, "saved command created");

    Ok((StatusCode::CREATED, ApiJson::new(command, SAVE_FAILED)))
}

/// Delete a command. Ids that are missing, or not integers, still yield 204.
async fn delete_saved_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let Ok(id) = id.parse::<i32>() else {
        tracing::debug!(id = %id, "ignoring delete of non-integer id");
        return Ok(StatusCode::NO_CONTENT);
    };

    state
        .storage
        .delete_saved_command(id)
        .await
        .map_err(ApiError::internal(DELETE_FAILED))?;

    tracing::info!(id, "saved command deleted");

    Ok(StatusCode::NO_CONTENT)
}
