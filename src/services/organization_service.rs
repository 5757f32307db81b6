use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::database::collection_name::{CollectionName, CollectionNameError};
use crate::database::models::organization::{normalize_email, Organization, RenameJournal, RenamePhase};
use crate::database::store::{CollectionError, OrganizationStore, UniqueField};
use crate::middleware::AuthOrg;
use crate::services::{CollectionManager, ServiceError};

/// Body of the create and update requests. Every field is optional here so
/// each operation can report which ones are missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationInput {
    #[serde(rename = "organization_name")]
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl OrganizationInput {
    /// Trimmed name, `None` when absent or blank.
    fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|s| !s.is_empty())
    }

    /// Passwords are taken verbatim; only the empty string counts as absent.
    fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|s| !s.is_empty())
    }
}

fn invalid_collection(err: CollectionNameError) -> ServiceError {
    ServiceError::Validation {
        field: "organization_name",
        message: match err {
            CollectionNameError::EmptySuffix(_) => {
                "organization_name must contain at least one letter, digit, or underscore".to_string()
            }
            CollectionNameError::TooLong { max, .. } => {
                format!("organization_name produces a collection name longer than {} characters", max)
            }
            CollectionNameError::Malformed(name) => format!("'{}' is not a valid collection name", name),
        },
    }
}

/// Organization lifecycle: registry record plus its dedicated collection.
#[derive(Clone)]
pub struct OrganizationService {
    orgs: Arc<dyn OrganizationStore>,
    collections: CollectionManager,
    hasher: PasswordHasher,
}

impl OrganizationService {
    pub fn new(orgs: Arc<dyn OrganizationStore>, collections: CollectionManager, hasher: PasswordHasher) -> Self {
        Self { orgs, collections, hasher }
    }

    /// Register an organization and provision its collection.
    pub async fn create(&self, input: OrganizationInput) -> Result<Organization, ServiceError> {
        let (Some(name), Some(email), Some(password)) = (input.name(), input.email(), input.password()) else {
            return Err(ServiceError::MissingFields(
                "organization_name, email, and password are required".to_string(),
            ));
        };

        let collection = CollectionName::from_org_name(name).map_err(invalid_collection)?;

        if let Some(existing) = self.orgs.find_conflict(name, &email, &collection).await? {
            let field = if existing.name == name {
                UniqueField::Name
            } else if existing.admin.email == email {
                UniqueField::Email
            } else {
                UniqueField::Collection
            };
            return Err(ServiceError::Conflict(field.conflict_message().to_string()));
        }

        let password_hash = self.hasher.hash(password).await?;

        self.collections.create(&collection).await?;

        let org = Organization::new(name.to_string(), collection, email, password_hash);
        if let Err(e) = self.orgs.insert(&org).await {
            // Lost a race or the store failed; the collection is ours to remove.
            self.collections.drop_quietly(&org.collection_name).await;
            return Err(e.into());
        }

        info!("Created organization {} ({}) with collection {}", org.name, org.id, org.collection_name);
        Ok(org)
    }

    /// Exact, case-sensitive lookup by trimmed name.
    pub async fn get(&self, name: Option<&str>) -> Result<Organization, ServiceError> {
        let name = name.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
            ServiceError::MissingFields(
                "organization_name query parameter is required and must be a non-empty string".to_string(),
            )
        })?;

        self.orgs
            .find_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::NameNotFound(name.to_string()))
    }

    /// Apply name, email and password changes for the authenticated organization.
    pub async fn update(&self, auth: AuthOrg, input: OrganizationInput) -> Result<Organization, ServiceError> {
        let (name, email, password) = (input.name(), input.email(), input.password());
        if name.is_none() && email.is_none() && password.is_none() {
            return Err(ServiceError::MissingFields(
                "At least one field (organization_name, email, password) is required".to_string(),
            ));
        }

        let mut org = self.load(auth.org_id).await?;
        self.resume_rename(&mut org).await?;

        // Validate everything before any collection is touched.
        let rename = match name.filter(|n| *n != org.name) {
            Some(new_name) => Some(self.plan_rename(&org, new_name).await?),
            None => None,
        };

        let new_email = match email.filter(|e| *e != org.admin.email) {
            Some(new_email) => {
                if let Some(other) = self.orgs.find_by_email(&new_email).await? {
                    if other.id != org.id {
                        return Err(ServiceError::Conflict(
                            "Admin email is already registered with another organization".to_string(),
                        ));
                    }
                }
                Some(new_email)
            }
            None => None,
        };

        let new_hash = match password {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };

        if let Some(journal) = rename {
            self.rename_collection(&mut org, journal).await?;
            org.commit_rename();
        }
        if let Some(email) = new_email {
            org.admin.email = email;
        }
        if let Some(hash) = new_hash {
            org.admin.password_hash = hash;
        }

        self.persist(&mut org).await?;
        info!("Updated organization {} ({})", org.name, org.id);
        Ok(org)
    }

    /// Drop the organization's collection and remove its record.
    pub async fn delete(&self, auth: AuthOrg) -> Result<Organization, ServiceError> {
        let org = self.load(auth.org_id).await?;

        if let Some(journal) = &org.rename {
            self.drop_unowned(&journal.to_collection).await?;
        }
        self.collections.drop_quietly(&org.collection_name).await;

        if !self.orgs.delete(org.id).await? {
            return Err(ServiceError::NotFound("Organization not found".to_string()));
        }

        info!("Deleted organization {} ({})", org.name, org.id);
        Ok(org)
    }

    async fn load(&self, id: Uuid) -> Result<Organization, ServiceError> {
        self.orgs
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Organization not found".to_string()))
    }

    async fn persist(&self, org: &mut Organization) -> Result<(), ServiceError> {
        org.touch();
        self.orgs.save(org).await?;
        Ok(())
    }

    async fn plan_rename(&self, org: &Organization, new_name: &str) -> Result<RenameJournal, ServiceError> {
        if self.orgs.find_by_name(new_name).await?.is_some() {
            return Err(ServiceError::Conflict(UniqueField::Name.conflict_message().to_string()));
        }

        let to_collection = CollectionName::from_org_name(new_name).map_err(invalid_collection)?;
        if to_collection == org.collection_name {
            return Err(ServiceError::Validation {
                field: "organization_name",
                message: "New organization name results in the same collection name".to_string(),
            });
        }
        if self.orgs.find_by_collection(&to_collection).await?.is_some() {
            return Err(ServiceError::Conflict(UniqueField::Collection.conflict_message().to_string()));
        }

        Ok(RenameJournal {
            to_name: new_name.to_string(),
            to_collection,
            phase: RenamePhase::Pending,
        })
    }

    /// Journaled create-copy-drop. On return the old collection is gone (or its
    /// drop was logged) and `org.rename` is in the `Copied` phase, ready to commit.
    async fn rename_collection(&self, org: &mut Organization, journal: RenameJournal) -> Result<(), ServiceError> {
        let from = org.collection_name.clone();
        let to = journal.to_collection.clone();

        org.rename = Some(journal);
        self.persist(org).await?;

        if let Err(e) = self.collections.copy_into_new(&from, &to).await {
            error!("Rename of {} to {} failed during copy: {}", from, to, e);
            if !matches!(e, CollectionError::AlreadyExists(_)) {
                self.collections.drop_quietly(&to).await;
            }
            org.rename = None;
            if let Err(clear) = self.persist(org).await {
                error!("Could not clear rename journal for {}: {}", org.id, clear);
            }
            return Err(e.into());
        }

        if let Some(journal) = org.rename.as_mut() {
            journal.phase = RenamePhase::Copied;
        }
        self.persist(org).await?;

        self.collections.drop_quietly(&from).await;
        Ok(())
    }

    /// Finish or undo a rename that was interrupted before it committed.
    async fn resume_rename(&self, org: &mut Organization) -> Result<(), ServiceError> {
        let Some(journal) = org.rename.clone() else {
            return Ok(());
        };

        match journal.phase {
            RenamePhase::Pending => {
                warn!(
                    "Rolling back interrupted rename of {} to {}",
                    org.collection_name, journal.to_collection
                );
                self.drop_unowned(&journal.to_collection).await?;
                org.rename = None;
                self.persist(org).await?;
            }
            RenamePhase::Copied => {
                warn!(
                    "Completing interrupted rename of {} to {}",
                    org.collection_name, journal.to_collection
                );
                let previous = org.commit_rename();
                self.persist(org).await?;
                if let Some(previous) = previous {
                    self.collections.drop_quietly(&previous).await;
                }
            }
        }
        Ok(())
    }

    /// Drop a journal target unless another organization has since claimed it.
    async fn drop_unowned(&self, collection: &CollectionName) -> Result<(), ServiceError> {
        match self.orgs.find_by_collection(collection).await? {
            Some(owner) => warn!("Leaving collection {} in place; it belongs to {}", collection, owner.id),
            None => self.collections.drop_quietly(collection).await,
        }
        Ok(())
    }
}
