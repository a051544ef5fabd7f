// tests/client_api_test.rs

use indicatif::ProgressBar;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use stream_dl::{
    client::{ApiClient, VideoApi},
    config::AppConfig,
    error::{AppError, AppResult},
    models::{DownloadRequest, DownloadType},
};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

fn client_for(server: &mockito::ServerGuard) -> AppResult<ApiClient> {
    let config = AppConfig::default().with_api_base(&format!("{}/api", server.url()));
    ApiClient::new(Arc::new(config))
}

fn preview_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "video_id": "dQw4w9WgXcQ",
            "title": "Test: Video",
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg",
            "duration": 212,
            "duration_string": "3:32",
            "uploader": "Rick Astley",
            "view_count": 1500000000u64,
            "qualities": [
                {"value": "best", "label": "Melhor qualidade", "note": "Máxima qualidade disponível"},
                {"value": "720p", "label": "720p", "note": "720p"},
                {"value": "360p", "label": "360p", "note": "360p"}
            ],
            "url": VIDEO_URL
        }
    })
}

#[tokio::test]
async fn test_validate_parses_preview() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/validate")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "url": VIDEO_URL })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(preview_body().to_string())
        .create_async()
        .await;
    let client = client_for(&server)?;

    // --- 2. Act (执行阶段) ---
    let preview = client.validate(VIDEO_URL).await?;

    // --- 3. Assert (断言阶段) ---
    mock.assert_async().await;
    assert_eq!(preview.title, "Test: Video");
    assert_eq!(preview.qualities.len(), 3);
    assert_eq!(preview.default_quality(), "best");
    assert_eq!(preview.qualities[1].display_label(), "720p - 720p");
    assert_eq!(preview.view_count, Some(1_500_000_000));
    Ok(())
}

#[tokio::test]
async fn test_validate_http_error_uses_server_message() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/validate")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "bad url"}"#)
        .create_async()
        .await;
    let client = client_for(&server)?;

    let err = client.validate(VIDEO_URL).await.unwrap_err();

    mock.assert_async().await;
    match err {
        AppError::Api { status, message } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "bad url");
        }
        other => panic!("意外的错误类型: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_validate_success_flag_false() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/validate")
        .with_status(200)
        .with_body(r#"{"success": false, "error": "Vídeo muito longo: 90 minutos."}"#)
        .create_async()
        .await;
    let client = client_for(&server)?;

    let err = client.validate(VIDEO_URL).await.unwrap_err();
    assert_eq!(err.to_string(), "Vídeo muito longo: 90 minutos.");
    Ok(())
}

#[tokio::test]
async fn test_validate_unparsable_error_falls_back() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/validate")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;
    let client = client_for(&server)?;

    let err = client.validate(VIDEO_URL).await.unwrap_err();
    assert!(matches!(err, AppError::Api { status: Some(502), .. }));
    assert_eq!(err.to_string(), "验证链接失败");
    Ok(())
}

#[tokio::test]
async fn test_download_returns_raw_bytes() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let media: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let mock = server
        .mock("POST", "/api/download")
        .match_body(Matcher::Json(json!({
            "url": VIDEO_URL,
            "quality": "720p",
            "download_type": "video"
        })))
        .with_status(200)
        .with_header("content-type", "video/mp4")
        .with_body(media.clone())
        .create_async()
        .await;
    let client = client_for(&server)?;

    let request = DownloadRequest {
        url: VIDEO_URL.to_string(),
        quality: "720p".to_string(),
        download_type: DownloadType::Video,
    };
    let pbar = ProgressBar::hidden();
    let mut sink = Vec::new();
    let body = client.download(&request, &mut sink, &pbar).await?;

    mock.assert_async().await;
    assert_eq!(sink, media);
    assert_eq!(body.size, 4096);
    assert_eq!(body.content_type.as_deref(), Some("video/mp4"));
    assert_eq!(pbar.position(), 4096);
    Ok(())
}

#[tokio::test]
async fn test_download_error_body() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/download")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "Erro ao fazer download do vídeo"}"#)
        .create_async()
        .await;
    let client = client_for(&server)?;

    let request = DownloadRequest {
        url: VIDEO_URL.to_string(),
        quality: "best".to_string(),
        download_type: DownloadType::Audio,
    };
    let mut sink = Vec::new();
    let err = client
        .download(&request, &mut sink, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert!(sink.is_empty());
    assert_eq!(err.to_string(), "Erro ao fazer download do vídeo");
    Ok(())
}

#[tokio::test]
async fn test_download_error_without_json_falls_back() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/download")
        .with_status(504)
        .with_body("upstream timed out")
        .create_async()
        .await;
    let client = client_for(&server)?;

    let request = DownloadRequest {
        url: VIDEO_URL.to_string(),
        quality: "best".to_string(),
        download_type: DownloadType::Video,
    };
    let mut sink = Vec::new();
    let err = client
        .download(&request, &mut sink, &ProgressBar::hidden())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Api { status: Some(504), .. }));
    assert_eq!(err.to_string(), "下载失败");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_network_failure() -> AppResult<()> {
    // 端口 9 (discard) 通常没有服务监听
    let config = AppConfig::default().with_api_base("http://127.0.0.1:9/api");
    let client = ApiClient::new(Arc::new(config))?;

    let err = client.validate(VIDEO_URL).await.unwrap_err();
    assert!(err.is_network_failure(), "应为网络错误: {:?}", err);
    Ok(())
}

#[tokio::test]
async fn test_health_and_info() -> AppResult<()> {
    let mut server = mockito::Server::new_async().await;
    let _health = server
        .mock("GET", "/api/health")
        .with_status(200)
        .with_body(r#"{"status": "healthy", "service": "youtube-downloader"}"#)
        .create_async()
        .await;
    let _info = server
        .mock("GET", "/api/info")
        .with_status(200)
        .with_body(
            json!({
                "endpoints": {
                    "/api/health": "Health check",
                    "/api/validate": "Validar URL e obter informações do vídeo"
                },
                "version": "1.0.0",
                "documentation": "https://github.com/seu-usuario/stream-downloader"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let client = client_for(&server)?;

    let health = client.health().await?;
    assert!(health.is_healthy());
    assert_eq!(health.service.as_deref(), Some("youtube-downloader"));

    let info = client.info().await?;
    assert_eq!(info.version.as_deref(), Some("1.0.0"));
    assert_eq!(info.endpoints.len(), 2);
    Ok(())
}
