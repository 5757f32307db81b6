use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which implementation backs the organization registry and tenant collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(StoreBackend::Postgres),
            "memory" | "mem" | "in-memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// `None` issues tokens without an `exp` claim.
    pub jwt_expiry_hours: Option<u64>,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

const DEV_JWT_SECRET: &str = "development-only-secret-change-me";

/// bcrypt rejects costs outside this range.
pub const BCRYPT_MIN_COST: u32 = 4;
pub const BCRYPT_MAX_COST: u32 = 31;

/// Upper bound for `SECURITY_JWT_EXPIRY_HOURS` (ten years).
pub const MAX_JWT_EXPIRY_HOURS: u64 = 10 * 365 * 24;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            self.database.backend = StoreBackend::parse(&v).unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_HOST") {
            self.api.host = v;
        }
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().ok().filter(|hours| *hours > 0);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    /// Checks the settings that would otherwise fail on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.environment != Environment::Development && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "the development secret cannot be used outside development".to_string(),
            });
        }
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "SECURITY_BCRYPT_COST",
                reason: format!("must be between {} and {}", BCRYPT_MIN_COST, BCRYPT_MAX_COST),
            });
        }
        if let Some(hours) = self.security.jwt_expiry_hours {
            if hours > MAX_JWT_EXPIRY_HOURS {
                return Err(ConfigError::Invalid {
                    key: "SECURITY_JWT_EXPIRY_HOURS",
                    reason: format!("must be at most {} hours", MAX_JWT_EXPIRY_HOURS),
                });
            }
        }
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: None,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: Vec::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: None,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: None,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// Configuration for tests and local demos: in-memory store, cheap hashing.
    pub fn for_testing() -> Self {
        let mut config = Self::development();
        config.database.backend = StoreBackend::Memory;
        config.security.jwt_secret = "test-secret".to_string();
        config.security.bcrypt_cost = BCRYPT_MIN_COST;
        config.api.enable_request_logging = false;
        config
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.security.bcrypt_cost, 12);
        assert!(config.security.jwt_expiry_hours.is_none());
    }

    #[test]
    fn test_default_production_config_requires_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/orgs".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));

        config.security.jwt_secret = DEV_JWT_SECRET.to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "JWT_SECRET", .. })));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_testing_config_is_valid() {
        let config = AppConfig::for_testing();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_rejects_out_of_range_bcrypt_cost() {
        let mut config = AppConfig::for_testing();
        config.security.bcrypt_cost = 40;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "SECURITY_BCRYPT_COST", .. })
        ));
    }

    #[test]
    fn test_rejects_unbounded_jwt_expiry() {
        let mut config = AppConfig::for_testing();
        config.security.jwt_expiry_hours = Some(MAX_JWT_EXPIRY_HOURS);
        assert!(config.validate().is_ok());

        config.security.jwt_expiry_hours = Some(u64::MAX);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "SECURITY_JWT_EXPIRY_HOURS", .. })
        ));
    }

    #[test]
    fn test_parses_backend_names() {
        assert_eq!(StoreBackend::parse("Memory"), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("postgresql"), Some(StoreBackend::Postgres));
        assert_eq!(StoreBackend::parse("mongo"), None);
    }
}
