use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    middleware::from_fn_with_state,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{PasswordHasher, TokenError, TokenKeys};
use crate::config::{AppConfig, ConfigError, StoreBackend};
use crate::database::memory::MemoryStore;
use crate::database::postgres::{PgCollectionStore, PgOrganizationStore};
use crate::database::store::{CollectionStore, OrganizationStore};
use crate::database::{DatabaseError, DatabaseManager};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AuthService, CollectionManager, OrganizationService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub organizations: OrganizationService,
    pub auth: AuthService,
    pub tokens: TokenKeys,
    pub registry: Arc<dyn OrganizationStore>,
    pub config: Arc<AppConfig>,
    pub database: Option<DatabaseManager>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        orgs: Arc<dyn OrganizationStore>,
        collections: Arc<dyn CollectionStore>,
    ) -> Result<Self, StartupError> {
        let tokens = TokenKeys::from_config(&config.security)?;
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);

        Ok(Self {
            organizations: OrganizationService::new(
                orgs.clone(),
                CollectionManager::new(collections),
                hasher.clone(),
            ),
            auth: AuthService::new(orgs.clone(), hasher, tokens.clone()),
            tokens,
            registry: orgs,
            config: Arc::new(config),
            database: None,
        })
    }

    /// State backed by a fresh [`MemoryStore`], returned alongside for inspection.
    pub fn in_memory(config: AppConfig) -> Result<(Self, Arc<MemoryStore>), StartupError> {
        let store = Arc::new(MemoryStore::new());
        let state = Self::new(config, store.clone(), store.clone())?;
        Ok((state, store))
    }

    /// Validate the configuration and connect the configured backend.
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        config.validate()?;

        match config.database.backend {
            StoreBackend::Memory => {
                warn!("Using in-memory store; data is lost on shutdown");
                Ok(Self::in_memory(config)?.0)
            }
            StoreBackend::Postgres => {
                let manager = DatabaseManager::connect(&config.database).await?;
                let orgs = Arc::new(PgOrganizationStore::new(manager.pool()));
                let collections = Arc::new(PgCollectionStore::new(manager.pool()));
                let mut state = Self::new(config, orgs, collections)?;
                state.database = Some(manager);
                Ok(state)
            }
        }
    }
}

/// Full router with every route and global layer.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Bearer token required
        .merge(protected_routes(state.clone()))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security.cors_origins))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/org/create", post(public::org::create_post))
        .route("/api/org/get", get(public::org::get))
        .route("/api/auth/login", post(public::auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/org/update", put(protected::org::update_put))
        .route("/api/org/delete", delete(protected::org::delete))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Tenant Organization API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "GET /health (public)",
                "org_create": "POST /api/org/create (public)",
                "org_get": "GET /api/org/get?organization_name= (public)",
                "login": "POST /api/auth/login (public - token acquisition)",
                "org_update": "PUT /api/org/update (bearer token)",
                "org_delete": "DELETE /api/org/delete (bearer token)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.registry.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Health check could not reach the store: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now(),
        "database": database,
    }))
}

/// Resolves on Ctrl+C so the server can drain in-flight requests.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
