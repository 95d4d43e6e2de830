use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Product;
use crate::domain::{matches_search, Page, RepositoryError};

/// List filter for products
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Substring match on the name
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, tenant_id: &str, id: Uuid) -> Result<Option<Product>, RepositoryError>;

    async fn list(
        &self,
        tenant_id: &str,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, u64), RepositoryError>;

    async fn save(&self, product: &Product) -> Result<(), RepositoryError>;

    async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryProductRepository {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl MemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn find_by_id(&self, tenant_id: &str, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id).filter(|p| p.tenant_id == tenant_id).cloned())
    }

    async fn list(
        &self,
        tenant_id: &str,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let products = self.products.read().await;
        let mut matched: Vec<&Product> = products
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .filter(|p| filter.is_active.map_or(true, |active| p.is_active == active))
            .filter(|p| matches_search(filter.search.as_deref(), &[p.name.as_str()]))
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        self.products.write().await.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let mut products = self.products.write().await;
        match products.get(&id) {
            Some(p) if p.tenant_id == tenant_id => Ok(products.remove(&id).is_some()),
            _ => Ok(false),
        }
    }
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, description, tags, is_active, created_by, updated_by, created_at, updated_at";

const PRODUCT_FILTER: &str =
    "tenant_id = $1 AND ($2::text IS NULL OR name ILIKE $2) AND ($3::boolean IS NULL OR is_active = $3)";

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, tenant_id: &str, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let query = format!("SELECT {} FROM products WHERE tenant_id = $1 AND id = $2", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list(
        &self,
        tenant_id: &str,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {}", PRODUCT_FILTER))
            .bind(tenant_id)
            .bind(pattern.as_deref())
            .bind(filter.is_active)
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM products WHERE {} ORDER BY created_at DESC, id LIMIT $4 OFFSET $5",
            PRODUCT_COLUMNS, PRODUCT_FILTER
        );
        let products = sqlx::query_as::<_, Product>(&query)
            .bind(tenant_id)
            .bind(pattern.as_deref())
            .bind(filter.is_active)
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((products, total.max(0) as u64))
    }

    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, tenant_id, name, description, tags, is_active, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                tags = EXCLUDED.tags,
                is_active = EXCLUDED.is_active,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.tags)
        .bind(product.is_active)
        .bind(&product.created_by)
        .bind(&product.updated_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        Ok(())
    }

    async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
