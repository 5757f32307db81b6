use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection_name::CollectionName;

/// Registered tenant. The password hash never leaves this type: everything
/// handed to clients goes through [`OrganizationSummary`] or [`LoginOrganization`].
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub collection_name: CollectionName,
    pub admin: AdminCredential,
    pub rename: Option<RenameJournal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminCredential {
    pub email: String,
    pub password_hash: String,
}

/// Persisted marker for an in-flight collection rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameJournal {
    pub to_name: String,
    pub to_collection: CollectionName,
    pub phase: RenamePhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePhase {
    /// Target collection may exist and may be partially filled.
    Pending,
    /// Every document reached the target; the source may still exist.
    Copied,
}

impl Organization {
    pub fn new(
        name: String,
        collection_name: CollectionName,
        email: String,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            collection_name,
            admin: AdminCredential { email, password_hash },
            rename: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Swap in the journal's target name and collection and clear the journal.
    /// Returns the collection that was replaced.
    pub fn commit_rename(&mut self) -> Option<CollectionName> {
        let journal = self.rename.take()?;
        self.name = journal.to_name;
        Some(std::mem::replace(&mut self.collection_name, journal.to_collection))
    }

    pub fn summary(&self) -> OrganizationSummary {
        OrganizationSummary::from(self)
    }
}

/// Client-facing organization metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub organization_id: Uuid,
    pub name: String,
    #[serde(rename = "collectionName")]
    pub collection_name: String,
    pub admin_email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Organization> for OrganizationSummary {
    fn from(org: &Organization) -> Self {
        Self {
            organization_id: org.id,
            name: org.name.clone(),
            collection_name: org.collection_name.to_string(),
            admin_email: org.admin.email.clone(),
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

/// Organization block returned alongside a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginOrganization {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Organization> for LoginOrganization {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id,
            name: org.name.clone(),
            email: org.admin.email.clone(),
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

/// Admin emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Organization {
        Organization::new(
            "Acme".to_string(),
            CollectionName::from_org_name("Acme").unwrap(),
            "admin@acme.io".to_string(),
            "$2b$04$hash".to_string(),
        )
    }

    #[test]
    fn summary_never_exposes_password_hash() {
        let json = serde_json::to_string(&sample().summary()).unwrap();
        assert!(!json.contains("$2b$04$hash"));
        assert!(!json.contains("password"));
        assert!(json.contains("\"collectionName\":\"org_acme\""));
    }

    #[test]
    fn commit_rename_swaps_name_and_collection() {
        let mut org = sample();
        org.rename = Some(RenameJournal {
            to_name: "Acme Two".to_string(),
            to_collection: CollectionName::from_org_name("Acme Two").unwrap(),
            phase: RenamePhase::Copied,
        });

        let old = org.commit_rename().unwrap();
        assert_eq!(old.as_str(), "org_acme");
        assert_eq!(org.name, "Acme Two");
        assert_eq!(org.collection_name.as_str(), "org_acme_two");
        assert!(org.rename.is_none());
        assert!(org.commit_rename().is_none());
    }

    #[test]
    fn journal_round_trips_through_json() {
        let journal = RenameJournal {
            to_name: "B".to_string(),
            to_collection: CollectionName::from_org_name("B").unwrap(),
            phase: RenamePhase::Pending,
        };
        let value = serde_json::to_value(&journal).unwrap();
        assert_eq!(value["phase"], "pending");
        assert_eq!(value["to_collection"], "org_b");
    }

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
