// handlers/public/org/create.rs - POST /api/org/create handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::organization::OrganizationSummary;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::OrganizationInput;

/**
 * POST /api/org/create - Register an organization and provision its collection
 *
 * Expected Input:
 * ```json
 * { "organization_name": "Acme Corp", "email": "admin@acme.io", "password": "..." }
 * ```
 *
 * Responds 201 with the organization summary (`collectionName` is
 * `org_acme_corp` for the input above). Duplicate name or email is a 400.
 */
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<OrganizationInput>, JsonRejection>,
) -> ApiResult<OrganizationSummary> {
    let Json(input) = payload?;

    let org = state
        .organizations
        .create(input)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to create organization"))?;

    Ok(ApiResponse::created(org.summary()).with_message("Organization created successfully"))
}
