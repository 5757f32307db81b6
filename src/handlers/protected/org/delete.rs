// handlers/protected/org/delete.rs - DELETE /api/org/delete handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthOrg};

/// DELETE /api/org/delete - drop the collection, then remove the record.
pub async fn delete(State(state): State<AppState>, auth: AuthOrg) -> ApiResult<Value> {
    let org = state
        .organizations
        .delete(auth)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to delete organization"))?;

    Ok(ApiResponse::success(json!({
        "organization_id": org.id,
        "name": org.name,
        "collectionName": org.collection_name,
    }))
    .with_message("Organization and all its data permanently deleted"))
}
