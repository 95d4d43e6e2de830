mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};

use common::*;

fn whoami(headers: &[(&str, String)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/auth/whoami");
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn public_routes_ignore_credentials_and_tenant() {
    let app = test_app();

    for request in [
        get("/health", None),
        get("/health", Some("garbage")),
        Request::builder()
            .uri("/")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .header("x-tenant-id", "closed")
            .body(Body::empty())
            .unwrap(),
    ] {
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}

#[tokio::test]
async fn health_reports_memory_store() {
    let app = test_app();
    let (status, body) = send(&app.router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "memory");
}

#[tokio::test]
async fn missing_token_is_401_with_static_message() {
    let app = test_app();
    let (status, body) = send(&app.router, whoami(&[("x-tenant-id", "acme".to_string())])).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], "Access token is required");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_authorization_is_missing_credential() {
    let app = test_app();
    let token = token("1", &["user"]);

    for header in [format!("bearer {}", token), token.clone(), format!("Bearer {} extra", token)] {
        let (status, body) = send(&app.router, whoami(&[("Authorization", header)])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access token is required");
    }
}

#[tokio::test]
async fn wrong_secret_or_expired_is_invalid_credential() {
    let app = test_app();

    for token in [
        token_signed_with("other-secret", "1", &["user"]),
        expired_token("1", 3600),
        expired_token("1", 5),
    ] {
        let (status, body) = send(&app.router, whoami(&[("Authorization", bearer(&token))])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired access token");
    }
}

#[tokio::test]
async fn tenant_header_wins_over_host() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        whoami(&[
            ("Authorization", bearer(&token("1", &["user"]))),
            ("x-tenant-id", "demo".to_string()),
            ("Host", "acme.example.com".to_string()),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenantId"], "demo");
    assert_eq!(body["data"]["tokenTenantId"], "1");
    assert_eq!(body["data"]["userId"], USER_ID);
}

#[tokio::test]
async fn subdomain_resolves_tenant() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        whoami(&[
            ("Authorization", bearer(&token("1", &["user"]))),
            ("Host", "acme.example.com".to_string()),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenantId"], "acme");
}

#[tokio::test]
async fn reserved_subdomain_falls_back_to_default() {
    let app = test_app();

    for host in ["www.example.com", "api.example.com"] {
        let (status, body) = send(
            &app.router,
            whoami(&[
                ("Authorization", bearer(&token("1", &["user"]))),
                ("Host", host.to_string()),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "host {}", host);
        assert_eq!(body["data"]["tenantId"], "1", "host {}", host);
    }
}

#[tokio::test]
async fn dotless_host_is_looked_up_as_tenant() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        whoami(&[
            ("Authorization", bearer(&token("1", &["user"]))),
            ("Host", "localhost:3000".to_string()),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or inactive tenant");
}

#[tokio::test]
async fn inactive_or_unknown_tenant_is_403() {
    let app = test_app();

    for tenant in ["closed", "ghost"] {
        let (status, body) = send(
            &app.router,
            whoami(&[
                ("Authorization", bearer(&token(tenant, &["user"]))),
                ("x-tenant-id", tenant.to_string()),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid or inactive tenant");
    }
}

#[tokio::test]
async fn empty_default_tenant_is_missing_tenant() {
    let mut config = test_config();
    config.tenant.default_tenant_id = String::new();
    let app = test_app_with(config);

    let (status, body) = send(&app.router, whoami(&[("Authorization", bearer(&token("1", &["user"])))])).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Tenant ID is required");
}

#[tokio::test]
async fn token_tenant_mismatch_rejected_when_enforced() {
    let mut config = test_config();
    config.security.enforce_token_tenant_match = true;
    let app = test_app_with(config);

    let mismatch = whoami(&[
        ("Authorization", bearer(&token("1", &["user"]))),
        ("x-tenant-id", "acme".to_string()),
    ]);
    let (status, body) = send(&app.router, mismatch).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or inactive tenant");

    let matching = whoami(&[
        ("Authorization", bearer(&token("acme", &["user"]))),
        ("x-tenant-id", "acme".to_string()),
    ]);
    let (status, _) = send(&app.router, matching).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_are_gated() {
    let app = test_app();

    let (status, _) = send(&app.router, get("/api/nothing-here", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, get("/api/nothing-here", Some(&token("1", &["user"])))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
