pub mod auth_service;
pub mod collection_manager;
pub mod organization_service;

pub use auth_service::{AuthService, LoginInput, Session};
pub use collection_manager::CollectionManager;
pub use organization_service::{OrganizationInput, OrganizationService};

use thiserror::Error;

use crate::auth::{PasswordError, TokenError};
use crate::database::store::{CollectionError, StoreError};

/// Outcome of an organization or auth operation that did not succeed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    MissingFields(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Lookup by organization name found nothing.
    #[error("no organization named {0:?}")]
    NameNotFound(String),

    /// Unknown email and wrong password are deliberately the same variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
