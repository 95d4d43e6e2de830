#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use modular_api::auth::{issue_token, IdentityClaims};
use modular_api::config::AppConfig;
use modular_api::messaging::MemoryEventPublisher;
use modular_api::tenant::{StaticTenantDirectory, Tenant};
use modular_api::{build_app, Stores};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const USER_ID: &str = "00000000-0000-0000-0000-000000000001";

pub struct TestApp {
    pub router: Router,
    pub events: Arc<MemoryEventPublisher>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.security.enable_cors = false;
    config
}

/// Demo tenant `1`, tenant ids `demo` and `acme`, and inactive `closed`
pub fn test_directory() -> StaticTenantDirectory {
    StaticTenantDirectory::with_demo_tenant()
        .with_tenant(Tenant::new("demo", "Demo by id", "demo-id", true))
        .with_tenant(Tenant::new("acme", "Acme Corp", "acme", true))
        .with_tenant(Tenant::new("closed", "Closed Corp", "closed", false))
}

pub fn test_app() -> TestApp {
    test_app_with(test_config())
}

pub fn test_app_with(config: AppConfig) -> TestApp {
    let events = Arc::new(MemoryEventPublisher::new());
    let router = build_app(&config, Stores::in_memory_with(test_directory()), events.clone());
    TestApp { router, events }
}

pub fn token(tenant: &str, roles: &[&str]) -> String {
    token_signed_with(TEST_SECRET, tenant, roles)
}

pub fn token_signed_with(secret: &str, tenant: &str, roles: &[&str]) -> String {
    let claims = IdentityClaims::new(
        USER_ID,
        "test@example.com",
        tenant,
        roles.iter().map(|r| r.to_string()).collect(),
        1,
    );
    issue_token(&claims, secret).unwrap()
}

/// Token whose `exp` passed `seconds_ago` seconds before now
pub fn expired_token(tenant: &str, seconds_ago: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = IdentityClaims {
        sub: USER_ID.to_string(),
        email: "test@example.com".to_string(),
        tenant_id: tenant.to_string(),
        roles: vec!["user".to_string()],
        iat: Some(now - seconds_ago - 3600),
        exp: now - seconds_ago,
    };
    issue_token(&claims, TEST_SECRET).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Sends one request through the router and decodes the JSON body (Null when empty)
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", bearer(token))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("Authorization", bearer(token))
        .body(Body::empty())
        .unwrap()
}
