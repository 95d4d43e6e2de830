//! Router assembly: shared state, route policies, middleware stack.

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::RequestAuthenticator;
use crate::config::{AppConfig, DatabaseConfig, SecurityConfig};
use crate::cqrs::Mediator;
use crate::database::{DatabaseError, DatabaseManager};
use crate::handlers::{protected, public};
use crate::messaging::EventPublisher;
use crate::middleware::{access_gate_middleware, AccessGate, RouteTable};
use crate::modules::products::{
    MemoryProductRepository, PgProductRepository, ProductHandlers, ProductRepository,
};
use crate::modules::users::{MemoryUserRepository, PgUserRepository, UserHandlers, UserRepository};
use crate::tenant::{PgTenantDirectory, StaticTenantDirectory, TenantDirectory, TenantResolver};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub mediator: Arc<Mediator>,
    /// None when running on the in-memory stores
    pub database: Option<DatabaseManager>,
}

/// Storage backends, selected once at startup
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub database: Option<DatabaseManager>,
}

impl Stores {
    /// In-memory repositories and a directory holding only the demo tenant
    pub fn in_memory() -> Self {
        Self::in_memory_with(StaticTenantDirectory::with_demo_tenant())
    }

    pub fn in_memory_with(tenants: StaticTenantDirectory) -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            products: Arc::new(MemoryProductRepository::new()),
            tenants: Arc::new(tenants),
            database: None,
        }
    }

    pub fn postgres(database: DatabaseManager) -> Self {
        let pool = database.pool().clone();
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            tenants: Arc::new(PgTenantDirectory::new(pool)),
            database: Some(database),
        }
    }

    /// PostgreSQL when `DATABASE_URL` is set, otherwise in-memory
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_none() {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            return Ok(Self::in_memory());
        }

        let database = DatabaseManager::connect(config).await?;
        if config.run_migrations {
            database.migrate().await?;
        }
        Ok(Self::postgres(database))
    }
}

/// Access policy for every route the router serves
pub fn route_table() -> RouteTable {
    const READERS: &[&str] = &["user", "admin"];
    const ADMINS: &[&str] = &["admin"];

    RouteTable::new()
        .public(Method::GET, "/")
        .public(Method::GET, "/health")
        .protected(Method::GET, "/api/auth/whoami")
        .protected(Method::POST, "/api/users")
        .restricted(Method::GET, "/api/users", READERS)
        .protected(Method::GET, "/api/users/:id")
        .restricted(Method::PATCH, "/api/users/:id", READERS)
        .restricted(Method::DELETE, "/api/users/:id", ADMINS)
        .restricted(Method::POST, "/api/products", READERS)
        .restricted(Method::GET, "/api/products", READERS)
        .restricted(Method::GET, "/api/products/:id", READERS)
        .restricted(Method::PATCH, "/api/products/:id", READERS)
        .restricted(Method::DELETE, "/api/products/:id", ADMINS)
}

pub fn build_mediator(stores: &Stores, events: Arc<dyn EventPublisher>) -> Mediator {
    let mut mediator = Mediator::new();
    UserHandlers::new(stores.users.clone(), events.clone()).register(&mut mediator);
    ProductHandlers::new(stores.products.clone(), events).register(&mut mediator);
    mediator
}

pub fn build_gate(config: &AppConfig, tenants: Arc<dyn TenantDirectory>) -> AccessGate {
    AccessGate::new(
        route_table(),
        RequestAuthenticator::with_hs256(&config.security.jwt_secret)
            .with_leeway(config.security.jwt_leeway_secs),
        TenantResolver::from_config(&config.tenant),
        tenants,
    )
    .enforce_token_tenant_match(config.security.enforce_token_tenant_match)
}

/// Full application router
pub fn build_app(config: &AppConfig, stores: Stores, events: Arc<dyn EventPublisher>) -> Router {
    let gate = Arc::new(build_gate(config, stores.tenants.clone()));
    let state = AppState {
        mediator: Arc::new(build_mediator(&stores, events)),
        database: stores.database,
    };

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route("/api/users", post(protected::users::create).get(protected::users::list))
        .route(
            "/api/users/:id",
            get(protected::users::get)
                .patch(protected::users::update)
                .delete(protected::users::delete),
        )
        .route("/api/products", post(protected::products::create).get(protected::products::list))
        .route(
            "/api/products/:id",
            get(protected::products::get)
                .patch(protected::products::update)
                .delete(protected::products::delete),
        )
        // Runs for every route, including unmatched ones
        .layer(middleware::from_fn_with_state(gate, access_gate_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)));

    match cors_layer(&config.security) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_table_covers_every_route() {
        let table = route_table();
        assert_eq!(table.len(), 13);
        assert!(table.policy(&Method::GET, Some("/health")).public);
        assert!(!table.policy(&Method::POST, Some("/api/users")).public);
        assert_eq!(
            table.policy(&Method::DELETE, Some("/api/users/:id")).required_roles,
            vec!["admin".to_string()]
        );
    }

    #[test]
    fn cors_disabled_or_permissive() {
        let mut security = AppConfig::development().security;
        security.enable_cors = false;
        assert!(cors_layer(&security).is_none());

        security.enable_cors = true;
        security.cors_origins = vec!["*".to_string()];
        assert!(cors_layer(&security).is_some());
    }
}
