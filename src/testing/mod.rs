use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{PasswordHasher, TokenKeys};
use crate::database::collection_name::CollectionName;
use crate::database::memory::MemoryStore;
use crate::database::models::organization::Organization;
use crate::database::store::{CollectionError, CollectionStore, Document, OrganizationStore, StoreError};
use crate::services::{AuthService, CollectionManager, OrganizationInput, OrganizationService};

/// Services wired to a fresh in-memory store with a cheap bcrypt cost.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub faults: Arc<FaultyStore>,
    pub hasher: PasswordHasher,
    pub tokens: TokenKeys,
    pub organizations: OrganizationService,
    pub auth: AuthService,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let hasher = PasswordHasher::new(4);
        let tokens = TokenKeys::new("test-secret", None).expect("test secret is not empty");

        let organizations = OrganizationService::new(
            faults.clone(),
            CollectionManager::new(faults.clone()),
            hasher.clone(),
        );
        let auth = AuthService::new(store.clone(), hasher.clone(), tokens.clone());

        Self {
            store,
            faults,
            hasher,
            tokens,
            organizations,
            auth,
        }
    }

    pub async fn create_org(&self, name: &str, email: &str, password: &str) -> Organization {
        self.organizations
            .create(OrganizationInput {
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                password: Some(password.to_string()),
            })
            .await
            .expect("test organization should be created")
    }
}

/// Delegates to a [`MemoryStore`] but fails selected writes on demand.
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    pub fail_insert: AtomicBool,
    pub fail_insert_many: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_insert: AtomicBool::new(false),
            fail_insert_many: AtomicBool::new(false),
        }
    }

    pub fn fail_next_inserts(&self, on: bool) {
        self.fail_insert.store(on, Ordering::SeqCst);
    }

    pub fn fail_document_copies(&self, on: bool) {
        self.fail_insert_many.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrganizationStore for FaultyStore {
    async fn insert(&self, org: &Organization) -> Result<(), StoreError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("registry write refused".to_string()));
        }
        self.inner.insert(org).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, StoreError> {
        self.inner.find_by_name(name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Organization>, StoreError> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_collection(&self, collection: &CollectionName) -> Result<Option<Organization>, StoreError> {
        self.inner.find_by_collection(collection).await
    }

    async fn find_conflict(
        &self,
        name: &str,
        email: &str,
        collection: &CollectionName,
    ) -> Result<Option<Organization>, StoreError> {
        self.inner.find_conflict(name, email, collection).await
    }

    async fn save(&self, org: &Organization) -> Result<(), StoreError> {
        self.inner.save(org).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

#[async_trait]
impl CollectionStore for FaultyStore {
    async fn create_collection(&self, name: &CollectionName) -> Result<(), CollectionError> {
        self.inner.create_collection(name).await
    }

    async fn collection_exists(&self, name: &CollectionName) -> Result<bool, CollectionError> {
        self.inner.collection_exists(name).await
    }

    async fn find_all(&self, name: &CollectionName) -> Result<Vec<Document>, CollectionError> {
        self.inner.find_all(name).await
    }

    async fn insert_many(&self, name: &CollectionName, documents: &[Document]) -> Result<(), CollectionError> {
        if self.fail_insert_many.load(Ordering::SeqCst) {
            return Err(CollectionError::Backend("document copy refused".to_string()));
        }
        self.inner.insert_many(name, documents).await
    }

    async fn drop_collection(&self, name: &CollectionName) -> Result<(), CollectionError> {
        self.inner.drop_collection(name).await
    }
}
