use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for cached feed pages, seconds.
    pub page_ttl_secs: u64,
    /// Bound on any single cache-store call before degrading to the
    /// uncached path, milliseconds.
    pub op_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub poll_interval_secs: u64,
    pub max_attempts: i32,
    pub backoff_base_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("APP_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.jwt_expiry_minutes = v.parse().unwrap_or(self.security.jwt_expiry_minutes);
        }
        if let Ok(v) = env::var("CACHE_PAGE_TTL_SECS") {
            self.cache.page_ttl_secs = v.parse().unwrap_or(self.cache.page_ttl_secs);
        }
        if let Ok(v) = env::var("CACHE_OP_TIMEOUT_MS") {
            self.cache.op_timeout_ms = v.parse().unwrap_or(self.cache.op_timeout_ms);
        }
        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.storage.root = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = v;
        }
        if let Ok(v) = env::var("WORKER_POLL_INTERVAL_SECS") {
            self.worker.poll_interval_secs = v.parse().unwrap_or(self.worker.poll_interval_secs);
        }
        if let Ok(v) = env::var("WORKER_MAX_ATTEMPTS") {
            self.worker.max_attempts = v.parse().unwrap_or(self.worker.max_attempts);
        }
        if let Ok(v) = env::var("WORKER_BACKOFF_BASE_SECS") {
            self.worker.backoff_base_secs = v.parse().unwrap_or(self.worker.backoff_base_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_minutes: 60 * 24,
            },
            cache: CacheConfig {
                page_ttl_secs: 600,
                op_timeout_ms: 250,
            },
            storage: StorageConfig {
                root: "./static".to_string(),
                public_base_url: "http://localhost:3000/static".to_string(),
            },
            worker: WorkerConfig {
                poll_interval_secs: 1,
                max_attempts: 5,
                backoff_base_secs: 2,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            security: SecurityConfig {
                // Must be overridden via JWT_SECRET in production
                jwt_secret: String::new(),
                jwt_expiry_minutes: 60,
            },
            cache: CacheConfig {
                page_ttl_secs: 600,
                op_timeout_ms: 250,
            },
            storage: StorageConfig {
                root: "/var/lib/mnu-portal/static".to_string(),
                public_base_url: "https://static.example.com".to_string(),
            },
            worker: WorkerConfig {
                poll_interval_secs: 5,
                max_attempts: 8,
                backoff_base_secs: 5,
            },
        }
    }
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
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.cache.page_ttl_secs, 600);
        assert_eq!(config.server.port, 3000);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn production_requires_secret_override() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.cache.page_ttl_secs, 600);
    }
}
