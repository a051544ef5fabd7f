// tests/client_retry_test.rs

use std::sync::Arc;
use stream_dl::client::{ApiClient, VideoApi};
use stream_dl::config::AppConfig;
use stream_dl::error::AppError;

const VIDEO_URL: &str = "https://youtu.be/dQw4w9WgXcQ";
const OK_BODY: &str = r#"{"success": true, "data": {"title": "Depois", "url": "https://youtu.be/dQw4w9WgXcQ"}}"#;

#[tokio::test(flavor = "multi_thread")]
async fn test_failures_surface_once_by_default() {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;
    let mock_503 = server
        .mock("POST", "/api/validate")
        .with_status(503)
        .with_body(r#"{"error": "Serviço indisponível"}"#)
        .expect(1)
        .create_async()
        .await;

    // 默认配置不重试
    let config = AppConfig::default().with_api_base(&format!("{}/api", server.url()));
    let client = ApiClient::new(Arc::new(config)).expect("Failed to create client");

    // --- 2. Act (执行阶段) ---
    let err = client.validate(VIDEO_URL).await.unwrap_err();

    // --- 3. Assert (断言阶段) ---
    mock_503.assert_async().await;
    assert!(matches!(err, AppError::Api { status: Some(503), .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_opt_in_retry_recovers_from_transient_error() {
    let mut server = mockito::Server::new_async().await;

    // 第一次请求 -> 503，第二次 -> 200
    let mock_503 = server
        .mock("POST", "/api/validate")
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(1)
        .create_async()
        .await;
    let mock_200 = server
        .mock("POST", "/api/validate")
        .with_status(200)
        .with_body(OK_BODY)
        .expect(1)
        .create_async()
        .await;

    let mut config = AppConfig::default().with_api_base(&format!("{}/api", server.url()));
    config.max_retries = 1;
    let client = ApiClient::new(Arc::new(config)).expect("Failed to create client");

    let preview = client
        .validate(VIDEO_URL)
        .await
        .expect("Request should eventually succeed");

    assert_eq!(preview.title, "Depois");
    mock_503.assert_async().await;
    mock_200.assert_async().await;
}
