mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

async fn create_product(app: &TestApp, token: &str, name: &str) -> serde_json::Value {
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/products",
            token,
            json!({ "name": name, "description": " Sample ", "tags": ["tag1", "tag2"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

#[tokio::test]
async fn create_and_fetch_product() {
    let app = test_app();
    let token = token("1", &["user"]);

    let product = create_product(&app, &token, "  Sample Template ").await;
    assert_eq!(product["name"], "Sample Template");
    assert_eq!(product["description"], "Sample");
    assert_eq!(product["tags"], json!(["tag1", "tag2"]));
    assert_eq!(product["isActive"], true);
    assert_eq!(product["createdBy"], USER_ID);
    assert_eq!(product["tenantId"], "1");

    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());
    let (status, body) = send(&app.router, get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], product);

    assert_eq!(app.events.topics(), vec!["products.created"]);
}

#[tokio::test]
async fn invalid_name_is_rejected() {
    let app = test_app();
    let token = token("1", &["user"]);

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/products", &token, json!({ "name": "Bad/Name" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["name"], "Product name can only contain letters, numbers, spaces, hyphens, and underscores");

    let (status, _) = send(&app.router, json_request("POST", "/api/products", &token, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn products_require_user_or_admin_role() {
    let app = test_app();
    let (status, body) = send(&app.router, get("/api/products", Some(&token("1", &[])))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient permissions");
}

#[tokio::test]
async fn list_filters_by_active_flag() {
    let app = test_app();
    let token = token("1", &["user"]);
    create_product(&app, &token, "Alpha").await;
    let beta = create_product(&app, &token, "Beta").await;

    let uri = format!("/api/products/{}", beta["id"].as_str().unwrap());
    let (status, _) = send(&app.router, json_request("PATCH", &uri, &token, json!({ "isActive": false }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app.router, get("/api/products", Some(&token))).await;
    assert_eq!(body["data"]["total"], 2);

    let (_, body) = send(&app.router, get("/api/products?isActive=true", Some(&token))).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["name"], "Alpha");

    let (_, body) = send(&app.router, get("/api/products?search=bet", Some(&token))).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["updatedBy"], USER_ID);
}

#[tokio::test]
async fn delete_requires_admin_and_reports_missing() {
    let app = test_app();
    let user_token = token("1", &["user"]);
    let admin_token = token("1", &["admin"]);
    let product = create_product(&app, &user_token, "Gizmo").await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let (status, _) = send(&app.router, delete(&uri, &user_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, delete(&uri, &admin_token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, delete(&uri, &admin_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("Product with ID {} not found", product["id"].as_str().unwrap())
    );

    assert_eq!(app.events.topics(), vec!["products.created", "products.deleted"]);
}
