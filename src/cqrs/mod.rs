//! Command/query dispatch. Each command or query type has exactly one handler,
//! looked up by the type itself.

use async_trait::async_trait;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::DomainError;

pub trait Command: Send + 'static {
    type Output: Send + 'static;
}

pub trait Query: Send + 'static {
    type Output: Send + 'static;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C) -> Result<C::Output, DomainError>;
}

#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn handle(&self, query: Q) -> Result<Q::Output, DomainError>;
}

type Registry = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

#[derive(Default)]
pub struct Mediator {
    commands: Registry,
    queries: Registry,
}

impl Mediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `C`, replacing any earlier one
    pub fn register_command<C, H>(&mut self, handler: H) -> &mut Self
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        self.commands.insert(TypeId::of::<C>(), Box::new(handler));
        self
    }

    pub fn register_query<Q, H>(&mut self, handler: H) -> &mut Self
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
        self.queries.insert(TypeId::of::<Q>(), Box::new(handler));
        self
    }

    pub async fn send<C: Command>(&self, command: C) -> Result<C::Output, DomainError> {
        let handler = self
            .commands
            .get(&TypeId::of::<C>())
            .and_then(|h| h.downcast_ref::<Arc<dyn CommandHandler<C>>>())
            .cloned()
            .ok_or(DomainError::Unhandled(type_name::<C>()))?;

        tracing::debug!(command = type_name::<C>(), "Dispatching command");
        handler.handle(command).await
    }

    pub async fn ask<Q: Query>(&self, query: Q) -> Result<Q::Output, DomainError> {
        let handler = self
            .queries
            .get(&TypeId::of::<Q>())
            .and_then(|h| h.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .cloned()
            .ok_or(DomainError::Unhandled(type_name::<Q>()))?;

        tracing::debug!(query = type_name::<Q>(), "Dispatching query");
        handler.handle(query).await
    }

    pub fn handler_count(&self) -> usize {
        self.commands.len() + self.queries.len()
    }
}
