//! Products: the reference CRUD entity every new module is modelled on.

pub mod commands;
pub mod queries;
pub mod repository;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::cqrs::Mediator;
use crate::domain::DomainError;
use crate::messaging::EventPublisher;

pub use commands::{CreateProduct, DeleteProduct, ProductChanges, UpdateProduct};
pub use queries::{GetProduct, ListProducts};
pub use repository::{MemoryProductRepository, PgProductRepository, ProductFilter, ProductRepository};

pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed product name: 1 to 100 letters, digits, spaces, `-` or `_`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductName(String);

impl ProductName {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("name", "Product name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(
                "name",
                format!("Product name cannot exceed {} characters", MAX_NAME_LEN),
            ));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_';
        if !trimmed.chars().all(allowed) {
            return Err(DomainError::validation(
                "name",
                "Product name can only contain letters, numbers, spaces, hyphens, and underscores",
            ));
        }

        Ok(ProductName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

pub(crate) fn normalize_description(description: Option<String>) -> String {
    description.map(|d| d.trim().to_string()).unwrap_or_default()
}

#[derive(Clone)]
pub struct ProductHandlers {
    repository: Arc<dyn ProductRepository>,
    events: Arc<dyn EventPublisher>,
}

impl ProductHandlers {
    pub fn new(repository: Arc<dyn ProductRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { repository, events }
    }

    pub fn register(self, mediator: &mut Mediator) {
        mediator
            .register_command::<CreateProduct, _>(self.clone())
            .register_command::<UpdateProduct, _>(self.clone())
            .register_command::<DeleteProduct, _>(self.clone())
            .register_query::<GetProduct, _>(self.clone())
            .register_query::<ListProducts, _>(self);
    }
}
