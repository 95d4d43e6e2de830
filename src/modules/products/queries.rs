use async_trait::async_trait;
use uuid::Uuid;

use super::{Product, ProductFilter, ProductHandlers};
use crate::cqrs::{Query, QueryHandler};
use crate::domain::{DomainError, Page, Paginated};

#[derive(Debug, Clone)]
pub struct GetProduct {
    pub tenant_id: String,
    pub id: Uuid,
}

impl Query for GetProduct {
    type Output = Product;
}

#[derive(Debug, Clone)]
pub struct ListProducts {
    pub tenant_id: String,
    pub page: Page,
    pub filter: ProductFilter,
}

impl Query for ListProducts {
    type Output = Paginated<Product>;
}

#[async_trait]
impl QueryHandler<GetProduct> for ProductHandlers {
    async fn handle(&self, query: GetProduct) -> Result<Product, DomainError> {
        self.repository
            .find_by_id(&query.tenant_id, query.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", &query.id.to_string()))
    }
}

#[async_trait]
impl QueryHandler<ListProducts> for ProductHandlers {
    async fn handle(&self, query: ListProducts) -> Result<Paginated<Product>, DomainError> {
        let (products, total) = self
            .repository
            .list(&query.tenant_id, &query.filter, query.page)
            .await?;
        Ok(Paginated::new(products, total, query.page))
    }
}
