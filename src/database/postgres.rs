//! Postgres backend. Organizations live in the `organizations` table; each
//! tenant collection is its own table of JSONB documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::collection_name::CollectionName;
use crate::database::manager::{COLLECTION_CONSTRAINT, EMAIL_CONSTRAINT};
use crate::database::models::organization::{AdminCredential, Organization, RenameJournal};
use crate::database::store::{
    CollectionError, CollectionStore, Document, OrganizationStore, StoreError, UniqueField,
};

// SQLSTATE codes
const UNIQUE_VIOLATION: &str = "23505";
const DUPLICATE_TABLE: &str = "42P07";
const UNDEFINED_TABLE: &str = "42P01";

/// Rows per INSERT when copying documents; keeps bind counts well under the protocol limit.
const INSERT_CHUNK: usize = 1000;

const SELECT_COLUMNS: &str = "id, name, collection_name, admin_email, admin_password, rename_state, created_at, updated_at";

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let field = match db.constraint() {
                    Some(EMAIL_CONSTRAINT) => UniqueField::Email,
                    Some(COLLECTION_CONSTRAINT) => UniqueField::Collection,
                    _ => UniqueField::Name,
                };
                return StoreError::DuplicateKey { field };
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
    collection_name: String,
    admin_email: String,
    admin_password: String,
    rename_state: Option<Json<RenameJournal>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = StoreError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        let collection_name = CollectionName::parse(row.collection_name)
            .map_err(|e| StoreError::Backend(format!("corrupt organization {}: {}", row.id, e)))?;
        Ok(Organization {
            id: row.id,
            name: row.name,
            collection_name,
            admin: AdminCredential {
                email: row.admin_email,
                password_hash: row.admin_password,
            },
            rename: row.rename_state.map(|Json(journal)| journal),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_organization(row: Option<OrganizationRow>) -> Result<Option<Organization>, StoreError> {
    row.map(Organization::try_from).transpose()
}

pub struct PgOrganizationStore {
    pool: PgPool,
}

impl PgOrganizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, clause: &str, value: &str) -> Result<Option<Organization>, StoreError> {
        let query = format!("SELECT {} FROM organizations WHERE {} = $1", SELECT_COLUMNS, clause);
        let row = sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        into_organization(row)
    }
}

#[async_trait]
impl OrganizationStore for PgOrganizationStore {
    async fn insert(&self, org: &Organization) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO organizations
                (id, name, collection_name, admin_email, admin_password, rename_state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(org.collection_name.as_str())
        .bind(&org.admin.email)
        .bind(&org.admin.password_hash)
        .bind(org.rename.as_ref().map(Json))
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let query = format!("SELECT {} FROM organizations WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        into_organization(row)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, StoreError> {
        self.find_where("name", name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Organization>, StoreError> {
        self.find_where("admin_email", email).await
    }

    async fn find_by_collection(&self, collection: &CollectionName) -> Result<Option<Organization>, StoreError> {
        self.find_where("collection_name", collection.as_str()).await
    }

    async fn find_conflict(
        &self,
        name: &str,
        email: &str,
        collection: &CollectionName,
    ) -> Result<Option<Organization>, StoreError> {
        let query = format!(
            "SELECT {} FROM organizations WHERE name = $1 OR admin_email = $2 OR collection_name = $3 LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(name)
            .bind(email)
            .bind(collection.as_str())
            .fetch_optional(&self.pool)
            .await?;
        into_organization(row)
    }

    async fn save(&self, org: &Organization) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET name = $2,
                collection_name = $3,
                admin_email = $4,
                admin_password = $5,
                rename_state = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(org.collection_name.as_str())
        .bind(&org.admin.email)
        .bind(&org.admin.password_hash)
        .bind(org.rename.as_ref().map(Json))
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgCollectionStore {
    pool: PgPool,
}

impl PgCollectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn collection_error(name: &CollectionName, err: sqlx::Error) -> CollectionError {
    match sqlstate(&err).as_deref() {
        Some(DUPLICATE_TABLE) => CollectionError::AlreadyExists(name.to_string()),
        Some(UNDEFINED_TABLE) => CollectionError::NotFound(name.to_string()),
        _ => CollectionError::Backend(err.to_string()),
    }
}

#[async_trait]
impl CollectionStore for PgCollectionStore {
    async fn create_collection(&self, name: &CollectionName) -> Result<(), CollectionError> {
        let ddl = format!(
            "CREATE TABLE {} (id BIGSERIAL PRIMARY KEY, document JSONB NOT NULL, created_at TIMESTAMPTZ NOT NULL DEFAULT now())",
            name.quoted()
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| collection_error(name, e))?;
        Ok(())
    }

    async fn collection_exists(&self, name: &CollectionName) -> Result<bool, CollectionError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| collection_error(name, e))
    }

    async fn find_all(&self, name: &CollectionName) -> Result<Vec<Document>, CollectionError> {
        let query = format!("SELECT document FROM {} ORDER BY id", name.quoted());
        sqlx::query_scalar::<_, Value>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| collection_error(name, e))
    }

    async fn insert_many(&self, name: &CollectionName, documents: &[Document]) -> Result<(), CollectionError> {
        let mut tx = self.pool.begin().await.map_err(|e| collection_error(name, e))?;

        for chunk in documents.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO {} (document) ", name.quoted()));
            builder.push_values(chunk, |mut row, document| {
                row.push_bind(Json(document));
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| collection_error(name, e))?;
        }

        tx.commit().await.map_err(|e| collection_error(name, e))
    }

    async fn drop_collection(&self, name: &CollectionName) -> Result<(), CollectionError> {
        let ddl = format!("DROP TABLE {}", name.quoted());
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| collection_error(name, e))?;
        Ok(())
    }
}
