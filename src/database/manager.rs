use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Registry table. Constraint names are matched when mapping unique violations.
const ORGANIZATIONS_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        collection_name TEXT NOT NULL,
        admin_email TEXT NOT NULL,
        admin_password TEXT NOT NULL,
        rename_state JSONB,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT organizations_name_key UNIQUE (name),
        CONSTRAINT organizations_admin_email_key UNIQUE (admin_email),
        CONSTRAINT organizations_collection_name_key UNIQUE (collection_name)
    )
"#;

pub const NAME_CONSTRAINT: &str = "organizations_name_key";
pub const EMAIL_CONSTRAINT: &str = "organizations_admin_email_key";
pub const COLLECTION_CONSTRAINT: &str = "organizations_collection_name_key";

/// Owns the connection pool shared by the registry and the tenant collections.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Connect using the configured URL and make sure the registry table exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database at {}", Self::redacted_url(url)?);

        let manager = Self { pool };
        manager.bootstrap().await?;
        Ok(manager)
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    async fn bootstrap(&self) -> Result<(), DatabaseError> {
        sqlx::query(ORGANIZATIONS_DDL).execute(&self.pool).await?;
        info!("Organization registry table ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Connection URL with any password masked, safe for logs.
    fn redacted_url(raw: &str) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if url.password().is_some() {
            url.set_password(Some("***"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(url.into())
    }
}
