use async_trait::async_trait;
use uuid::Uuid;

use super::{User, UserHandlers};
use crate::cqrs::{Query, QueryHandler};
use crate::domain::{DomainError, Page, Paginated};

#[derive(Debug, Clone)]
pub struct GetUser {
    pub tenant_id: String,
    pub id: Uuid,
}

impl Query for GetUser {
    type Output = User;
}

#[derive(Debug, Clone)]
pub struct ListUsers {
    pub tenant_id: String,
    pub page: Page,
    /// Matches email, first or last name
    pub search: Option<String>,
}

impl Query for ListUsers {
    type Output = Paginated<User>;
}

#[async_trait]
impl QueryHandler<GetUser> for UserHandlers {
    async fn handle(&self, query: GetUser) -> Result<User, DomainError> {
        self.repository
            .find_by_id(&query.tenant_id, query.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", &query.id.to_string()))
    }
}

#[async_trait]
impl QueryHandler<ListUsers> for UserHandlers {
    async fn handle(&self, query: ListUsers) -> Result<Paginated<User>, DomainError> {
        let (users, total) = self
            .repository
            .list(&query.tenant_id, query.search.as_deref(), query.page)
            .await?;
        Ok(Paginated::new(users, total, query.page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cqrs::Mediator;
    use crate::messaging::MemoryEventPublisher;
    use crate::modules::users::{CreateUser, MemoryUserRepository};
    use std::sync::Arc;

    async fn seeded() -> Mediator {
        let mut mediator = Mediator::new();
        UserHandlers::new(Arc::new(MemoryUserRepository::new()), Arc::new(MemoryEventPublisher::new()))
            .register(&mut mediator);

        for name in ["alice", "bob", "carol"] {
            mediator
                .send(CreateUser {
                    tenant_id: "acme".to_string(),
                    email: format!("{}@acme.com", name),
                    password: "password123".to_string(),
                    first_name: None,
                    last_name: None,
                    roles: None,
                })
                .await
                .unwrap();
        }
        mediator
    }

    #[tokio::test]
    async fn get_returns_not_found_for_unknown_id() {
        let mediator = seeded().await;
        let err = mediator
            .ask(GetUser {
                tenant_id: "acme".to_string(),
                id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_paginates_and_searches() {
        let mediator = seeded().await;

        let page = mediator
            .ask(ListUsers {
                tenant_id: "acme".to_string(),
                page: Page::new(Some(1), Some(2)),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total_pages, 2);

        let found = mediator
            .ask(ListUsers {
                tenant_id: "acme".to_string(),
                page: Page::default(),
                search: Some("bob".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.data[0].email, "bob@acme.com");

        let other = mediator
            .ask(ListUsers {
                tenant_id: "other".to_string(),
                page: Page::default(),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(other.total, 0);
    }
}
