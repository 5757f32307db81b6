// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{LoginInput, Session};

/// Login body: the session sits beside `success` rather than under `data`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub session: Session,
}

/**
 * POST /api/auth/login - Authenticate an organization admin
 *
 * Expected Input:
 * ```json
 * { "email": "admin@acme.io", "password": "..." }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "message": "Login successful",
 *   "token": "eyJhbGciOiJIUzI1NiI...",
 *   "organization": { "id": "...", "name": "Acme", "email": "admin@acme.io",
 *                     "createdAt": "...", "updatedAt": "..." }
 * }
 * ```
 *
 * Unknown email and wrong password both answer 401 "Invalid credentials".
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(input) = payload?;

    let session = state
        .auth
        .login(input)
        .await
        .map_err(|e| ApiError::from(e).masked("Login failed"))?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful",
        session,
    }))
}
