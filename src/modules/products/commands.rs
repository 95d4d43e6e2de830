use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{normalize_description, Product, ProductHandlers, ProductName};
use crate::cqrs::{Command, CommandHandler};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub tenant_id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl Command for CreateProduct {
    type Output = Product;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub tenant_id: String,
    pub user_id: String,
    pub id: Uuid,
    pub changes: ProductChanges,
}

impl Command for UpdateProduct {
    type Output = Product;
}

#[derive(Debug, Clone)]
pub struct DeleteProduct {
    pub tenant_id: String,
    pub user_id: String,
    pub id: Uuid,
}

impl Command for DeleteProduct {
    type Output = ();
}

fn product_event(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id,
        "name": product.name,
        "tenantId": product.tenant_id,
        "isActive": product.is_active,
    })
}

#[async_trait]
impl CommandHandler<CreateProduct> for ProductHandlers {
    async fn handle(&self, command: CreateProduct) -> Result<Product, DomainError> {
        let name = ProductName::parse(&command.name)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id: command.tenant_id,
            name: name.into_inner(),
            description: normalize_description(command.description),
            tags: command.tags.unwrap_or_default(),
            is_active: true,
            created_by: command.user_id,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };

        self.repository.save(&product).await?;
        tracing::info!(product_id = %product.id, tenant_id = %product.tenant_id, "Product created");

        self.events
            .publish("products.created", &product.id.to_string(), product_event(&product))
            .await?;

        Ok(product)
    }
}

#[async_trait]
impl CommandHandler<UpdateProduct> for ProductHandlers {
    async fn handle(&self, command: UpdateProduct) -> Result<Product, DomainError> {
        let id = command.id.to_string();
        let mut product = self
            .repository
            .find_by_id(&command.tenant_id, command.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", &id))?;

        let changes = command.changes;
        if let Some(name) = changes.name {
            product.name = ProductName::parse(&name)?.into_inner();
        }
        if changes.description.is_some() {
            product.description = normalize_description(changes.description);
        }
        if let Some(tags) = changes.tags {
            product.tags = tags;
        }
        if let Some(is_active) = changes.is_active {
            product.is_active = is_active;
        }
        product.updated_by = Some(command.user_id);
        product.updated_at = Utc::now();

        self.repository.save(&product).await?;

        self.events
            .publish("products.updated", &id, product_event(&product))
            .await?;

        Ok(product)
    }
}

#[async_trait]
impl CommandHandler<DeleteProduct> for ProductHandlers {
    async fn handle(&self, command: DeleteProduct) -> Result<(), DomainError> {
        let id = command.id.to_string();
        if !self.repository.delete(&command.tenant_id, command.id).await? {
            return Err(DomainError::not_found("Product", &id));
        }

        tracing::info!(product_id = %id, tenant_id = %command.tenant_id, user_id = %command.user_id, "Product deleted");

        self.events
            .publish(
                "products.deleted",
                &id,
                json!({ "id": id, "tenantId": command.tenant_id, "deletedBy": command.user_id }),
            )
            .await?;

        Ok(())
    }
}
