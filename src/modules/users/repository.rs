use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::User;
use crate::domain::{matches_search, Page, RepositoryError};

/// Storage for users. Every lookup is scoped to one tenant.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, tenant_id: &str, id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, tenant_id: &str, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Newest first; returns the page and the total match count
    async fn list(
        &self,
        tenant_id: &str,
        search: Option<&str>,
        page: Page,
    ) -> Result<(Vec<User>, u64), RepositoryError>;

    /// Insert or replace by id. Email is unique per tenant.
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;

    /// Returns false when nothing was deleted
    async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, tenant_id: &str, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.tenant_id == tenant_id).cloned())
    }

    async fn find_by_email(&self, tenant_id: &str, email: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.tenant_id == tenant_id && u.email == email)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: &str,
        search: Option<&str>,
        page: Page,
    ) -> Result<(Vec<User>, u64), RepositoryError> {
        let users = self.users.read().await;
        let mut matched: Vec<&User> = users
            .values()
            .filter(|u| u.tenant_id == tenant_id)
            .filter(|u| {
                matches_search(
                    search,
                    &[
                        u.email.as_str(),
                        u.first_name.as_deref().unwrap_or_default(),
                        u.last_name.as_deref().unwrap_or_default(),
                    ],
                )
            })
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

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;

        let duplicate = users
            .values()
            .any(|u| u.id != user.id && u.tenant_id == user.tenant_id && u.email == user.email);
        if duplicate {
            return Err(RepositoryError::Duplicate(format!("email {}", user.email)));
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().await;
        match users.get(&id) {
            Some(u) if u.tenant_id == tenant_id => Ok(users.remove(&id).is_some()),
            _ => Ok(false),
        }
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, tenant_id, email, password_hash, first_name, last_name, roles, is_active, created_at, updated_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, tenant_id: &str, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {} FROM users WHERE tenant_id = $1 AND id = $2", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, tenant_id: &str, email: &str) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {} FROM users WHERE tenant_id = $1 AND email = $2", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list(
        &self,
        tenant_id: &str,
        search: Option<&str>,
        page: Page,
    ) -> Result<(Vec<User>, u64), RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let filter = "tenant_id = $1 AND ($2::text IS NULL OR email ILIKE $2 OR first_name ILIKE $2 OR last_name ILIKE $2)";

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM users WHERE {}", filter))
            .bind(tenant_id)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM users WHERE {} ORDER BY created_at DESC, id LIMIT $3 OFFSET $4",
            USER_COLUMNS, filter
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(pattern.as_deref())
            .bind(page.limit as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total.max(0) as u64))
    }

    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, password_hash, first_name, last_name, roles, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                roles = EXCLUDED.roles,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.tenant_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.roles)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        Ok(())
    }

    async fn delete(&self, tenant_id: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
