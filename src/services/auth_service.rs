use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{PasswordHasher, TokenKeys};
use crate::database::models::organization::{normalize_email, LoginOrganization};
use crate::database::store::OrganizationStore;
use crate::services::ServiceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Issued token plus the organization it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub organization: LoginOrganization,
}

/// Admin credential checks and session token issuance.
#[derive(Clone)]
pub struct AuthService {
    orgs: Arc<dyn OrganizationStore>,
    hasher: PasswordHasher,
    tokens: TokenKeys,
}

impl AuthService {
    pub fn new(orgs: Arc<dyn OrganizationStore>, hasher: PasswordHasher, tokens: TokenKeys) -> Self {
        Self { orgs, hasher, tokens }
    }

    pub async fn login(&self, input: LoginInput) -> Result<Session, ServiceError> {
        let email = input.email.as_deref().map(normalize_email).filter(|e| !e.is_empty());
        let password = input.password.as_deref().filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(ServiceError::MissingFields("Email and password required".to_string()));
        };

        let Some(org) = self.orgs.find_by_email(&email).await? else {
            self.hasher.verify_dummy(password).await?;
            warn!("Login rejected: no organization for {}", email);
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &org.admin.password_hash).await? {
            warn!("Login rejected: wrong password for organization {}", org.id);
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(org.id)?;
        info!("Organization {} logged in", org.id);

        Ok(Session {
            token,
            organization: LoginOrganization::from(&org),
        })
    }
}
