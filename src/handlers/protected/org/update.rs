// handlers/protected/org/update.rs - PUT /api/org/update handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::organization::OrganizationSummary;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthOrg};
use crate::services::OrganizationInput;

/**
 * PUT /api/org/update - Change name, admin email and/or password
 *
 * Expected Input (at least one field):
 * ```json
 * { "organization_name": "Acme Labs", "email": "ops@acme.io", "password": "..." }
 * ```
 *
 * A new name moves every document into the collection derived from it and
 * drops the old one.
 */
pub async fn update_put(
    State(state): State<AppState>,
    auth: AuthOrg,
    payload: Result<Json<OrganizationInput>, JsonRejection>,
) -> ApiResult<OrganizationSummary> {
    let Json(input) = payload?;

    let org = state
        .organizations
        .update(auth, input)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to update organization"))?;

    Ok(ApiResponse::success(org.summary()).with_message("Organization updated successfully"))
}
