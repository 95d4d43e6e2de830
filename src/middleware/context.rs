use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::auth::IdentityClaims;
use crate::error::{ApiError, GateRejection};

/// Per-request state produced by the access gate. Empty on public routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    tenant_id: Option<String>,
    identity: Option<IdentityClaims>,
}

/// Tenant and caller a command or query runs for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant_id: String,
    pub user_id: String,
    pub roles: Vec<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(tenant_id: impl Into<String>, identity: IdentityClaims) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            identity: Some(identity),
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn identity(&self) -> Option<&IdentityClaims> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|c| c.sub.as_str())
    }

    pub fn is_anonymous(&self) -> bool {
        self.tenant_id.is_none() && self.identity.is_none()
    }

    /// Scope for handlers that need an authenticated tenant
    pub fn scope(&self) -> Result<TenantScope, ApiError> {
        match (&self.tenant_id, &self.identity) {
            (Some(tenant_id), Some(identity)) => Ok(TenantScope {
                tenant_id: tenant_id.clone(),
                user_id: identity.sub.clone(),
                roles: identity.roles.clone(),
            }),
            (_, None) => Err(GateRejection::MissingCredential.into()),
            (None, Some(_)) => Err(GateRejection::MissingTenant.into()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<RequestContext>().cloned().unwrap_or_default())
    }
}
