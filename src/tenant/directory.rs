use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use super::Tenant;

#[derive(Debug, thiserror::Error)]
pub enum TenantLookupError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Lookup service for tenant records
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>, TenantLookupError>;

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, TenantLookupError>;

    /// Not found counts as inactive
    async fn is_active(&self, tenant_id: &str) -> Result<bool, TenantLookupError> {
        Ok(self.find_by_id(tenant_id).await?.map(|t| t.is_active).unwrap_or(false))
    }
}

/// Fixed set of tenants held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticTenantDirectory {
    tenants: HashMap<String, Tenant>,
}

impl StaticTenantDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Directory holding the demo tenant `1` (sub-domain `demo`)
    pub fn with_demo_tenant() -> Self {
        Self::empty().with_tenant(Tenant::new("1", "Demo Tenant", "demo", true))
    }

    pub fn with_tenant(mut self, tenant: Tenant) -> Self {
        self.tenants.insert(tenant.id.clone(), tenant);
        self
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>, TenantLookupError> {
        Ok(self.tenants.get(tenant_id).cloned())
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, TenantLookupError> {
        Ok(self.tenants.values().find(|t| t.subdomain == subdomain).cloned())
    }
}

/// Tenants table in the main database
#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>, TenantLookupError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, subdomain, is_active, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, TenantLookupError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, subdomain, is_active, created_at, updated_at
            FROM tenants
            WHERE subdomain = $1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn is_active(&self, tenant_id: &str) -> Result<bool, TenantLookupError> {
        let active: Option<(bool,)> = sqlx::query_as("SELECT is_active FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!(tenant_id, found = active.is_some(), "Tenant lookup");
        Ok(active.map(|(a,)| a).unwrap_or(false))
    }
}
