//! Raw HTTP checks against a running API.

#![allow(clippy::unwrap_used)]

use markethub_integration_tests::{TestServer, tracked};

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::start(Vec::new()).await.unwrap();

    for path in ["health", "health/ready"] {
        let response = server
            .client
            .get(server.base_url.join(path).unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "{path}");
        assert!(response.headers().contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn test_product_json_shape() {
    let server = TestServer::start(vec![tracked("lamp", 2000, 3)]).await.unwrap();

    let body: serde_json::Value = server
        .client
        .get(server.base_url.join("api/products/lamp").unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["price"], "20.00");
    assert_eq!(body["status"], "active");
    assert_eq!(body["inventory"]["available"], 3);
}

#[tokio::test]
async fn test_cart_requires_token() {
    let server = TestServer::start(Vec::new()).await.unwrap();

    let response = server
        .client
        .get(server.base_url.join("api/auth/cart").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "unauthorized");
}
