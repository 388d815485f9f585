//! Integration tests for the service surface outside `/api/auth`

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::Value;
use tribridge_auth::auth::AuthService;
use tribridge_auth::configuration::{JwtSettings, PasswordSettings};
use tribridge_auth::startup::run;
use tribridge_auth::store::InMemoryCredentialStore;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let jwt = JwtSettings {
        access_secret: "health-access-secret".to_string(),
        refresh_secret: "health-refresh-secret".to_string(),
        access_token_expiry: 86400,
        refresh_token_expiry: 604800,
        issuer: "tribridge".to_string(),
    };
    let service = AuthService::new(
        Arc::new(InMemoryCredentialStore::new()),
        &jwt,
        &PasswordSettings::default(),
    )
    .expect("Failed to build auth service");

    let server = run(listener, service).expect("Failed to create server");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_route_returns_uniform_404() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/wallet/balances", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "API端点未找到");
}
