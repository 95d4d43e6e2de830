use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Secret used when nothing is configured. Accepted outside production only.
pub const DEFAULT_JWT_SECRET: &str = "your-secret-key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub tenant: TenantConfig,
    pub messaging: MessagingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. When unset the in-memory stores are used.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Clock skew tolerated on token expiry, in seconds
    pub jwt_leeway_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Reject requests whose token `tenantId` differs from the resolved tenant.
    pub enforce_token_tenant_match: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub default_tenant_id: String,
    pub header_name: String,
    pub reserved_subdomains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    pub brokers: Vec<String>,
    pub client_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Fallback filter when `RUST_LOG` is not set
    pub filter: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT secret must not be empty")]
    EmptySecret,
    #[error("the default JWT secret is not allowed in production")]
    DefaultSecretInProduction,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = v.parse().unwrap_or(self.server.request_timeout_secs);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("JWT_LEEWAY_SECS") {
            self.security.jwt_leeway_secs = v.parse().unwrap_or(self.security.jwt_leeway_secs);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Some(v) = lookup("SECURITY_ENFORCE_TOKEN_TENANT") {
            self.security.enforce_token_tenant_match =
                v.parse().unwrap_or(self.security.enforce_token_tenant_match);
        }

        // Tenant overrides
        if let Some(v) = lookup("DEFAULT_TENANT_ID") {
            self.tenant.default_tenant_id = v;
        }
        if let Some(v) = lookup("TENANT_HEADER") {
            if !v.trim().is_empty() {
                self.tenant.header_name = v.trim().to_ascii_lowercase();
            }
        }
        if let Some(v) = lookup("TENANT_RESERVED_SUBDOMAINS") {
            self.tenant.reserved_subdomains = split_list(&v);
        }

        // Messaging overrides
        if let Some(v) = lookup("KAFKA_BROKERS") {
            self.messaging.brokers = split_list(&v);
        }
        if let Some(v) = lookup("KAFKA_CLIENT_ID") {
            self.messaging.client_id = v;
        }

        // Logging overrides
        if let Some(v) = lookup("LOG_FORMAT") {
            self.logging.format = match v.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => self.logging.format,
            };
        }

        self
    }

    /// Checks settings that must never reach a running server
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.environment == Environment::Production && self.security.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::DefaultSecretInProduction);
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Copy safe to print: the signing secret and database credentials are masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.security.jwt_secret = "********".to_string();
        if copy.database.url.is_some() {
            copy.database.url = Some("********".to_string());
        }
        copy
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                jwt_leeway_secs: 0,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enforce_token_tenant_match: false,
            },
            tenant: TenantConfig::default(),
            messaging: MessagingConfig::default(),
            logging: LoggingConfig {
                format: LogFormat::Pretty,
                filter: "debug,sqlx=warn".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_secs: 20,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                jwt_leeway_secs: 0,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                enforce_token_tenant_match: false,
            },
            tenant: TenantConfig::default(),
            messaging: MessagingConfig::default(),
            logging: LoggingConfig {
                format: LogFormat::Json,
                filter: "info".to_string(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_secs: 15,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                jwt_secret: DEFAULT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 4,
                jwt_leeway_secs: 0,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                enforce_token_tenant_match: false,
            },
            tenant: TenantConfig::default(),
            messaging: MessagingConfig::default(),
            logging: LoggingConfig {
                format: LogFormat::Json,
                filter: "info".to_string(),
            },
        }
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            default_tenant_id: "1".to_string(),
            header_name: "x-tenant-id".to_string(),
            reserved_subdomains: vec!["www".to_string(), "api".to_string()],
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            client_id: "modular-api".to_string(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
