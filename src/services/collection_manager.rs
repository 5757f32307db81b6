use std::sync::Arc;
use tracing::{info, warn};

use crate::database::collection_name::CollectionName;
use crate::database::store::{CollectionError, CollectionStore};

/// Creates, copies and drops tenant collections.
///
/// A rename is `copy_into_new` followed by `drop_quietly` of the source; the
/// organization service journals the step between the two.
#[derive(Clone)]
pub struct CollectionManager {
    store: Arc<dyn CollectionStore>,
}

impl CollectionManager {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, name: &CollectionName) -> Result<(), CollectionError> {
        self.store.create_collection(name).await?;
        info!("Created tenant collection {}", name);
        Ok(())
    }

    /// Create `to` and fill it with every document of `from`. Returns the number copied.
    /// A missing `from` counts as empty.
    pub async fn copy_into_new(&self, from: &CollectionName, to: &CollectionName) -> Result<usize, CollectionError> {
        self.create(to).await?;

        let documents = match self.store.find_all(from).await {
            Ok(documents) => documents,
            Err(CollectionError::NotFound(_)) => {
                warn!("Source collection {} is missing; {} starts empty", from, to);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if !documents.is_empty() {
            self.store.insert_many(to, &documents).await?;
        }

        info!("Copied {} documents from {} to {}", documents.len(), from, to);
        Ok(documents.len())
    }

    /// Drop a collection, logging instead of failing when it is already gone
    /// or the store refuses.
    pub async fn drop_quietly(&self, name: &CollectionName) {
        match self.store.drop_collection(name).await {
            Ok(()) => info!("Dropped tenant collection {}", name),
            Err(CollectionError::NotFound(_)) => {
                warn!("Collection {} may not exist or was already dropped", name)
            }
            Err(e) => warn!("Failed to drop collection {}: {}", name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use serde_json::json;

    fn setup() -> (Arc<MemoryStore>, CollectionManager) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), CollectionManager::new(store))
    }

    fn name(raw: &str) -> CollectionName {
        CollectionName::from_org_name(raw).unwrap()
    }

    #[tokio::test]
    async fn copy_then_drop_moves_every_document() {
        let (store, manager) = setup();
        let (a, b) = (name("A"), name("B"));
        manager.create(&a).await.unwrap();
        store
            .insert_many(&a, &[json!({"n": 1}), json!({"n": 2}), json!({"n": 3})])
            .await
            .unwrap();

        let copied = manager.copy_into_new(&a, &b).await.unwrap();
        manager.drop_quietly(&a).await;

        assert_eq!(copied, 3);
        assert!(!store.collection_exists(&a).await.unwrap());
        assert_eq!(
            store.find_all(&b).await.unwrap(),
            vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]
        );
    }

    #[tokio::test]
    async fn copy_of_empty_collection_creates_empty_target() {
        let (store, manager) = setup();
        let (a, b) = (name("A"), name("B"));
        manager.create(&a).await.unwrap();

        assert_eq!(manager.copy_into_new(&a, &b).await.unwrap(), 0);
        assert!(store.collection_exists(&b).await.unwrap());
        assert!(store.find_all(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn copy_from_missing_source_creates_empty_target() {
        let (store, manager) = setup();
        let (a, b) = (name("A"), name("B"));

        assert_eq!(manager.copy_into_new(&a, &b).await.unwrap(), 0);
        assert!(store.collection_exists(&b).await.unwrap());
        assert!(!store.collection_exists(&a).await.unwrap());
    }

    #[tokio::test]
    async fn copy_refuses_existing_target() {
        let (store, manager) = setup();
        let (a, b) = (name("A"), name("B"));
        manager.create(&a).await.unwrap();
        manager.create(&b).await.unwrap();

        assert!(matches!(
            manager.copy_into_new(&a, &b).await,
            Err(CollectionError::AlreadyExists(_))
        ));
        assert!(store.collection_exists(&a).await.unwrap());
    }

    #[tokio::test]
    async fn dropping_twice_is_silent() {
        let (store, manager) = setup();
        let a = name("A");
        manager.create(&a).await.unwrap();

        manager.drop_quietly(&a).await;
        manager.drop_quietly(&a).await;
        assert!(!store.collection_exists(&a).await.unwrap());
    }
}
