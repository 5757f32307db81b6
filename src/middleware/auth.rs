use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Claims;
use crate::error::ApiError;

/// Authenticated organization, injected by [`jwt_auth_middleware`] and taken
/// by protected handlers as an explicit argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthOrg {
    pub org_id: Uuid,
}

impl From<Claims> for AuthOrg {
    fn from(claims: Claims) -> Self {
        Self { org_id: claims.org_id }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthOrg
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthOrg>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized: Missing organization context"))
    }
}

/// Validates the bearer token and injects [`AuthOrg`] into the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::warn!("Rejected session token: {}", e);
        ApiError::unauthorized("Invalid token")
    })?;

    let auth_org = AuthOrg::from(claims);
    tracing::debug!("Authenticated organization {}", auth_org.org_id);
    request.extensions_mut().insert(auth_org);

    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` header, if well formed.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
