//! In-process backend for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::collection_name::CollectionName;
use crate::database::models::organization::Organization;
use crate::database::store::{
    CollectionError, CollectionStore, Document, OrganizationStore, StoreError, UniqueField,
};

/// Holds the registry and every tenant collection in memory.
#[derive(Default)]
pub struct MemoryStore {
    organizations: RwLock<HashMap<Uuid, Organization>>,
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every collection currently present, sorted.
    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn organization_count(&self) -> usize {
        self.organizations.read().await.len()
    }
}

/// First uniqueness clash between `candidate` and any other record.
fn clash(orgs: &HashMap<Uuid, Organization>, candidate: &Organization) -> Option<UniqueField> {
    orgs.values().filter(|o| o.id != candidate.id).find_map(|o| {
        if o.name == candidate.name {
            Some(UniqueField::Name)
        } else if o.admin.email == candidate.admin.email {
            Some(UniqueField::Email)
        } else if o.collection_name == candidate.collection_name {
            Some(UniqueField::Collection)
        } else {
            None
        }
    })
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn insert(&self, org: &Organization) -> Result<(), StoreError> {
        let mut orgs = self.organizations.write().await;
        if let Some(field) = clash(&orgs, org) {
            return Err(StoreError::DuplicateKey { field });
        }
        orgs.insert(org.id, org.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, StoreError> {
        let orgs = self.organizations.read().await;
        Ok(orgs.values().find(|o| o.name == name).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Organization>, StoreError> {
        let orgs = self.organizations.read().await;
        Ok(orgs.values().find(|o| o.admin.email == email).cloned())
    }

    async fn find_by_collection(&self, collection: &CollectionName) -> Result<Option<Organization>, StoreError> {
        let orgs = self.organizations.read().await;
        Ok(orgs.values().find(|o| &o.collection_name == collection).cloned())
    }

    async fn find_conflict(
        &self,
        name: &str,
        email: &str,
        collection: &CollectionName,
    ) -> Result<Option<Organization>, StoreError> {
        let orgs = self.organizations.read().await;
        Ok(orgs
            .values()
            .find(|o| o.name == name || o.admin.email == email || &o.collection_name == collection)
            .cloned())
    }

    async fn save(&self, org: &Organization) -> Result<(), StoreError> {
        let mut orgs = self.organizations.write().await;
        if !orgs.contains_key(&org.id) {
            return Err(StoreError::NotFound);
        }
        if let Some(field) = clash(&orgs, org) {
            return Err(StoreError::DuplicateKey { field });
        }
        orgs.insert(org.id, org.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.organizations.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn create_collection(&self, name: &CollectionName) -> Result<(), CollectionError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name.as_str()) {
            return Err(CollectionError::AlreadyExists(name.to_string()));
        }
        collections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn collection_exists(&self, name: &CollectionName) -> Result<bool, CollectionError> {
        Ok(self.collections.read().await.contains_key(name.as_str()))
    }

    async fn find_all(&self, name: &CollectionName) -> Result<Vec<Document>, CollectionError> {
        self.collections
            .read()
            .await
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| CollectionError::NotFound(name.to_string()))
    }

    async fn insert_many(&self, name: &CollectionName, documents: &[Document]) -> Result<(), CollectionError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name.as_str())
            .ok_or_else(|| CollectionError::NotFound(name.to_string()))?;
        collection.extend_from_slice(documents);
        Ok(())
    }

    async fn drop_collection(&self, name: &CollectionName) -> Result<(), CollectionError> {
        self.collections
            .write()
            .await
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| CollectionError::NotFound(name.to_string()))
    }
}
