mod common;

use common::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app.get("/health_check").await;

    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = spawn_app();

    let response = app.get("/health_check").await;

    let id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("Missing x-request-id header");
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn client_request_id_is_echoed_back() {
    let app = spawn_app();
    let id = uuid::Uuid::new_v4().to_string();

    let response = app
        .client
        .get(app.url("/health_check"))
        .header("x-request-id", &id)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(
        Some(id.as_str()),
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok())
    );
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = spawn_app();

    let response = app.get("/api/editor").await;

    assert_eq!(404, response.status().as_u16());
}
