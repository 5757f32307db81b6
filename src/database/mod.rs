pub mod collection_name;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use collection_name::{CollectionName, CollectionNameError};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use store::{CollectionError, CollectionStore, Document, OrganizationStore, StoreError, UniqueField};
