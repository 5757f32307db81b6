//! Storage seams for the organization registry and tenant collections.
//!
//! Both traits are implemented by the Postgres backend in
//! [`crate::database::postgres`] and by [`crate::database::memory::MemoryStore`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::database::collection_name::CollectionName;
use crate::database::models::organization::Organization;

/// A tenant document. Collections are schemaless.
pub type Document = Value;

/// Registry columns that carry a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Name,
    Email,
    Collection,
}

impl UniqueField {
    pub fn conflict_message(self) -> &'static str {
        match self {
            UniqueField::Name => "Organization name already exists",
            UniqueField::Email => "Admin email already registered",
            UniqueField::Collection => "Organization name conflicts with an existing organization's collection",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique field {field:?}")]
    DuplicateKey { field: UniqueField },

    #[error("organization not found")]
    NotFound,

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection already exists: {0}")]
    AlreadyExists(String),

    #[error("collection not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// Persistence for organization records.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Fails with `DuplicateKey` when name, email or collection is taken.
    async fn insert(&self, org: &Organization) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Organization>, StoreError>;

    async fn find_by_collection(&self, collection: &CollectionName) -> Result<Option<Organization>, StoreError>;

    /// Any organization whose name, email or collection matches one of the arguments.
    async fn find_conflict(
        &self,
        name: &str,
        email: &str,
        collection: &CollectionName,
    ) -> Result<Option<Organization>, StoreError>;

    /// Persist every mutable field of an existing record.
    async fn save(&self, org: &Organization) -> Result<(), StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Container primitives for per-tenant collections.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Fails with `AlreadyExists` if the collection is present.
    async fn create_collection(&self, name: &CollectionName) -> Result<(), CollectionError>;

    async fn collection_exists(&self, name: &CollectionName) -> Result<bool, CollectionError>;

    /// Every document in insertion order.
    async fn find_all(&self, name: &CollectionName) -> Result<Vec<Document>, CollectionError>;

    async fn insert_many(&self, name: &CollectionName, documents: &[Document]) -> Result<(), CollectionError>;

    /// Fails with `NotFound` if the collection is absent.
    async fn drop_collection(&self, name: &CollectionName) -> Result<(), CollectionError>;
}
