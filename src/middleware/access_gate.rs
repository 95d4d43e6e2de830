use axum::{
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::context::RequestContext;
use super::routes::RouteTable;
use crate::auth::RequestAuthenticator;
use crate::error::{ApiError, GateRejection};
use crate::tenant::{ResolveTenant, TenantDirectory, TenantResolver};

/// What the gate sees of an inbound request
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub method: &'a Method,
    /// Matched route pattern, e.g. `/api/users/:id`
    pub route: Option<&'a str>,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

/// Ordered pre-handler check: public bypass, then authentication, then tenant.
pub struct AccessGate<R = TenantResolver> {
    routes: RouteTable,
    authenticator: RequestAuthenticator,
    resolver: R,
    directory: Arc<dyn TenantDirectory>,
    enforce_token_tenant_match: bool,
}

impl<R: ResolveTenant> AccessGate<R> {
    pub fn new(
        routes: RouteTable,
        authenticator: RequestAuthenticator,
        resolver: R,
        directory: Arc<dyn TenantDirectory>,
    ) -> Self {
        Self {
            routes,
            authenticator,
            resolver,
            directory,
            enforce_token_tenant_match: false,
        }
    }

    /// Also require the token's `tenantId` to equal the resolved tenant
    pub fn enforce_token_tenant_match(mut self, enforce: bool) -> Self {
        self.enforce_token_tenant_match = enforce;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub async fn check(&self, request: &GateRequest<'_>) -> Result<RequestContext, GateRejection> {
        let path = request.path;
        let policy = self.routes.policy(request.method, request.route);

        if policy.public {
            tracing::trace!(path, "Public route, access gate bypassed");
            return Ok(RequestContext::anonymous());
        }

        let authorization = request.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let claims = match self.authenticator.authenticate(authorization) {
            Ok(claims) => claims,
            Err(rejection) => {
                if rejection == GateRejection::MissingCredential {
                    tracing::warn!(path, "No JWT token provided");
                } else {
                    tracing::warn!(path, reason = rejection.kind(), "Authentication rejected");
                }
                return Err(rejection);
            }
        };

        tracing::debug!(
            user_id = %claims.sub,
            token_tenant_id = %claims.tenant_id,
            path,
            "JWT token validated"
        );

        let Some(tenant_id) = self.resolver.resolve(request.headers) else {
            tracing::warn!(path, user_id = %claims.sub, "No tenant ID found in request");
            return Err(GateRejection::MissingTenant);
        };

        // Lookup failures are treated as an inactive tenant
        let active = match self.directory.is_active(&tenant_id).await {
            Ok(active) => active,
            Err(e) => {
                tracing::error!(tenant_id = %tenant_id, path, error = %e, "Tenant lookup failed");
                false
            }
        };

        if !active {
            tracing::warn!(tenant_id = %tenant_id, user_id = %claims.sub, path, "Invalid or inactive tenant");
            return Err(GateRejection::InvalidTenant);
        }

        if self.enforce_token_tenant_match && claims.tenant_id != tenant_id {
            tracing::warn!(
                tenant_id = %tenant_id,
                token_tenant_id = %claims.tenant_id,
                user_id = %claims.sub,
                path,
                "Token tenant does not match resolved tenant"
            );
            return Err(GateRejection::InvalidTenant);
        }

        if !policy.required_roles.is_empty() && !claims.has_any_role(&policy.required_roles) {
            tracing::warn!(
                tenant_id = %tenant_id,
                user_id = %claims.sub,
                required = ?policy.required_roles,
                path,
                "Insufficient permissions"
            );
            return Err(GateRejection::InsufficientRole);
        }

        tracing::debug!(tenant_id = %tenant_id, path, "Tenant validated");

        Ok(RequestContext::authenticated(tenant_id, claims))
    }
}

/// Runs the gate and stores the resulting `RequestContext` in the request
pub async fn access_gate_middleware(
    State(gate): State<Arc<AccessGate>>,
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let context = {
        let path = parts.uri.path().to_string();
        let gate_request = GateRequest {
            method: &parts.method,
            route: matched_path.as_ref().map(|m| m.as_str()),
            path: &path,
            headers: &parts.headers,
        };
        gate.check(&gate_request).await?
    };

    parts.extensions.insert(context);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_token, IdentityClaims};
    use crate::tenant::{StaticTenantDirectory, Tenant, TenantLookupError};
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "gate-test-secret";

    /// Resolver wrapper that counts invocations
    struct CountingResolver {
        inner: TenantResolver,
        calls: AtomicUsize,
    }

    impl CountingResolver {
        fn new() -> Self {
            Self {
                inner: TenantResolver::from_config(&Default::default()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ResolveTenant for CountingResolver {
        fn resolve(&self, headers: &HeaderMap) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(headers)
        }
    }

    impl ResolveTenant for Arc<CountingResolver> {
        fn resolve(&self, headers: &HeaderMap) -> Option<String> {
            self.as_ref().resolve(headers)
        }
    }

    struct NoTenant;

    impl ResolveTenant for NoTenant {
        fn resolve(&self, _headers: &HeaderMap) -> Option<String> {
            None
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl TenantDirectory for FailingDirectory {
        async fn find_by_id(&self, _tenant_id: &str) -> Result<Option<Tenant>, TenantLookupError> {
            Err(TenantLookupError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_subdomain(&self, _subdomain: &str) -> Result<Option<Tenant>, TenantLookupError> {
            Err(TenantLookupError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn directory() -> Arc<dyn TenantDirectory> {
        Arc::new(
            StaticTenantDirectory::with_demo_tenant()
                .with_tenant(Tenant::new("demo", "Demo by name", "demo-name", true))
                .with_tenant(Tenant::new("acme", "Acme", "acme", true))
                .with_tenant(Tenant::new("closed", "Closed", "closed", false)),
        )
    }

    fn routes() -> RouteTable {
        RouteTable::new()
            .public(Method::GET, "/health")
            .protected(Method::GET, "/api/items")
            .restricted(Method::DELETE, "/api/items/:id", &["admin"])
    }

    fn gate_with<R: ResolveTenant>(resolver: R, directory: Arc<dyn TenantDirectory>) -> AccessGate<R> {
        AccessGate::new(routes(), RequestAuthenticator::with_hs256(SECRET), resolver, directory)
    }

    fn token(tenant: &str, roles: &[&str]) -> String {
        let claims = IdentityClaims::new(
            "user-123",
            "test@example.com",
            tenant,
            roles.iter().map(|r| r.to_string()).collect(),
            1,
        );
        issue_token(&claims, SECRET).unwrap()
    }

    fn headers(pairs: &[(&'static str, String)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    async fn check<R: ResolveTenant>(
        gate: &AccessGate<R>,
        method: Method,
        route: &str,
        headers: &HeaderMap,
    ) -> Result<RequestContext, GateRejection> {
        let request = GateRequest {
            method: &method,
            route: Some(route),
            path: route,
            headers,
        };
        gate.check(&request).await
    }

    #[tokio::test]
    async fn public_route_allows_anything() {
        let resolver = Arc::new(CountingResolver::new());
        let gate = gate_with(resolver.clone(), directory());

        for h in [
            headers(&[]),
            headers(&[("authorization", "garbage".to_string())]),
            headers(&[("authorization", "Bearer not.a.jwt".to_string()), ("x-tenant-id", "closed".to_string())]),
        ] {
            let ctx = check(&gate, Method::GET, "/health", &h).await.unwrap();
            assert!(ctx.is_anonymous());
        }
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn missing_token_rejected_before_tenant_resolution() {
        let resolver = Arc::new(CountingResolver::new());
        let gate = gate_with(resolver.clone(), directory());

        let result = check(&gate, Method::GET, "/api/items", &headers(&[("x-tenant-id", "acme".to_string())])).await;

        assert_eq!(result, Err(GateRejection::MissingCredential));
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_token_rejected_before_tenant_resolution() {
        let resolver = Arc::new(CountingResolver::new());
        let gate = gate_with(resolver.clone(), directory());
        let forged = {
            let claims = IdentityClaims::new("u", "u@example.com", "acme", vec![], 1);
            issue_token(&claims, "some-other-secret").unwrap()
        };

        let result = check(
            &gate,
            Method::GET,
            "/api/items",
            &headers(&[("authorization", format!("Bearer {}", forged))]),
        )
        .await;

        assert_eq!(result, Err(GateRejection::InvalidCredential));
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn header_tenant_used_verbatim() {
        let resolver = Arc::new(CountingResolver::new());
        let gate = gate_with(resolver.clone(), directory());
        let h = headers(&[
            ("authorization", format!("Bearer {}", token("acme", &["user"]))),
            ("x-tenant-id", "demo".to_string()),
            ("host", "acme.example.com".to_string()),
        ]);

        let ctx = check(&gate, Method::GET, "/api/items", &h).await.unwrap();

        assert_eq!(ctx.tenant_id(), Some("demo"));
        assert_eq!(ctx.user_id(), Some("user-123"));
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn inactive_or_unknown_tenant_rejected() {
        let gate = gate_with(TenantResolver::from_config(&Default::default()), directory());

        for tenant in ["closed", "unknown"] {
            let h = headers(&[
                ("authorization", format!("Bearer {}", token(tenant, &["user"]))),
                ("x-tenant-id", tenant.to_string()),
            ]);
            let result = check(&gate, Method::GET, "/api/items", &h).await;
            assert_eq!(result, Err(GateRejection::InvalidTenant), "tenant {}", tenant);
        }
    }

    #[tokio::test]
    async fn active_tenant_allows_with_full_context() {
        let gate = gate_with(TenantResolver::from_config(&Default::default()), directory());
        let h = headers(&[
            ("authorization", format!("Bearer {}", token("1", &["user"]))),
            ("host", "acme.example.com".to_string()),
        ]);

        let ctx = check(&gate, Method::GET, "/api/items", &h).await.unwrap();

        assert_eq!(ctx.tenant_id(), Some("acme"));
        let identity = ctx.identity().unwrap();
        assert_eq!(identity.email, "test@example.com");
        assert_eq!(identity.tenant_id, "1");
    }

    #[tokio::test]
    async fn unresolvable_tenant_is_missing_tenant() {
        let gate = gate_with(NoTenant, directory());
        let h = headers(&[("authorization", format!("Bearer {}", token("1", &["user"])))]);

        assert_eq!(
            check(&gate, Method::GET, "/api/items", &h).await,
            Err(GateRejection::MissingTenant)
        );
    }

    #[tokio::test]
    async fn directory_failure_fails_closed() {
        let gate = gate_with(TenantResolver::from_config(&Default::default()), Arc::new(FailingDirectory));
        let h = headers(&[("authorization", format!("Bearer {}", token("1", &["user"])))]);

        assert_eq!(
            check(&gate, Method::GET, "/api/items", &h).await,
            Err(GateRejection::InvalidTenant)
        );
    }

    #[tokio::test]
    async fn token_tenant_mismatch_allowed_unless_enforced() {
        let h = headers(&[
            ("authorization", format!("Bearer {}", token("1", &["user"]))),
            ("x-tenant-id", "acme".to_string()),
        ]);

        let lenient = gate_with(TenantResolver::from_config(&Default::default()), directory());
        assert!(check(&lenient, Method::GET, "/api/items", &h).await.is_ok());

        let strict = gate_with(TenantResolver::from_config(&Default::default()), directory())
            .enforce_token_tenant_match(true);
        assert_eq!(
            check(&strict, Method::GET, "/api/items", &h).await,
            Err(GateRejection::InvalidTenant)
        );
    }

    #[tokio::test]
    async fn required_roles_are_enforced_after_tenant_check() {
        let gate = gate_with(TenantResolver::from_config(&Default::default()), directory());

        let user = headers(&[("authorization", format!("Bearer {}", token("1", &["user"])))]);
        assert_eq!(
            check(&gate, Method::DELETE, "/api/items/:id", &user).await,
            Err(GateRejection::InsufficientRole)
        );

        let admin = headers(&[("authorization", format!("Bearer {}", token("1", &["admin"])))]);
        assert!(check(&gate, Method::DELETE, "/api/items/:id", &admin).await.is_ok());

        // an inactive tenant is reported before the role check
        let closed = headers(&[
            ("authorization", format!("Bearer {}", token("closed", &["user"]))),
            ("x-tenant-id", "closed".to_string()),
        ]);
        assert_eq!(
            check(&gate, Method::DELETE, "/api/items/:id", &closed).await,
            Err(GateRejection::InvalidTenant)
        );
    }
}
