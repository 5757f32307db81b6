// handlers/public/org/get.rs - GET /api/org/get handler

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::organization::OrganizationSummary;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct OrgQuery {
    pub organization_name: Option<String>,
}

/// GET /api/org/get?organization_name= - exact, case-sensitive lookup.
pub async fn get(
    State(state): State<AppState>,
    query: Result<Query<OrgQuery>, QueryRejection>,
) -> ApiResult<OrganizationSummary> {
    let Query(query) = query?;

    let org = state
        .organizations
        .get(query.organization_name.as_deref())
        .await
        .map_err(|e| ApiError::from(e).masked("Failed to retrieve organization"))?;

    Ok(ApiResponse::success(org.summary()).with_message("Organization retrieved successfully"))
}
