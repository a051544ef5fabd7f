// src/client.rs

use crate::{
    config::AppConfig,
    constants::api::{endpoints, messages},
    error::*,
    models::{
        DownloadRequest, VideoPreview,
        api::{ApiInfo, ErrorBody, HealthStatus, ValidateResponse},
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use reqwest::{Response, StatusCode, header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use std::{io::Write, sync::Arc};

/// download 响应的元信息；内容本身已写入调用方提供的 sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBody {
    pub size: u64,
    pub content_type: Option<String>,
}

/// 后端 API 的抽象，会话层只依赖这个 trait
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn validate(&self, url: &str) -> AppResult<VideoPreview>;

    /// 把响应体逐块写入 `sink`。出错时 sink 中可能只有部分内容，由调用方丢弃。
    async fn download(
        &self,
        request: &DownloadRequest,
        sink: &mut (dyn Write + Send),
        pbar: &ProgressBar,
    ) -> AppResult<MediaBody>;
}

#[derive(Clone)]
pub struct ApiClient {
    pub client: ClientWithMiddleware,
    config: Arc<AppConfig>,
}

impl ApiClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;

        let mut builder = ClientBuilder::new(inner);
        if config.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            client: builder.build(),
            config,
        })
    }

    async fn post_json<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> AppResult<Response> {
        let url = self.config.endpoint(endpoint)?;
        debug!("POST {}", url);
        let res = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        debug!("POST {} -> {}", endpoint, res.status());
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> AppResult<T> {
        let url = self.config.endpoint(endpoint)?;
        debug!("GET {}", url);
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| format!("服务器返回 {}", status));
            return Err(AppError::api(Some(status.as_u16()), message));
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn health(&self) -> AppResult<HealthStatus> {
        self.get_json(endpoints::HEALTH).await
    }

    pub async fn info(&self) -> AppResult<ApiInfo> {
        self.get_json(endpoints::INFO).await
    }
}

#[async_trait]
impl VideoApi for ApiClient {
    async fn validate(&self, url: &str) -> AppResult<VideoPreview> {
        let res = self.post_json(endpoints::VALIDATE, &json!({ "url": url })).await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| messages::VALIDATE_FAILED.to_string());
            warn!("validate 失败 ({}): {}", status, message);
            return Err(AppError::api(Some(status.as_u16()), message));
        }

        match serde_json::from_str::<ValidateResponse>(&body) {
            Ok(ValidateResponse {
                success: true,
                data: Some(preview),
                ..
            }) => {
                info!("解析成功: {}", preview.title);
                Ok(preview)
            }
            Ok(response) => {
                let message = response
                    .error
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| messages::VALIDATE_UNKNOWN.to_string());
                warn!("validate 返回 success=false: {}", message);
                Err(AppError::api(Some(status.as_u16()), message))
            }
            Err(e) => {
                warn!("无法解析 validate 响应: {}", e);
                Err(AppError::api(Some(status.as_u16()), messages::VALIDATE_UNKNOWN))
            }
        }
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        sink: &mut (dyn Write + Send),
        pbar: &ProgressBar,
    ) -> AppResult<MediaBody> {
        info!(
            "请求下载: {} ({}) 清晰度 {}",
            request.url, request.download_type, request.quality
        );
        let res = self.post_json(endpoints::DOWNLOAD, request).await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| messages::DOWNLOAD_FAILED.to_string());
            warn!("download 失败 ({}): {}", status, message);
            return Err(AppError::api(Some(status.as_u16()), message));
        }

        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        // Content-Length 只用于显示进度，不作为分配依据
        if let Some(len) = res.content_length() {
            pbar.set_length(len);
        }

        let mut size = 0u64;
        let mut stream = res.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            sink.write_all(&chunk)?;
            size += chunk.len() as u64;
            pbar.inc(chunk.len() as u64);
        }
        sink.flush()?;
        debug!("download 完成，共 {} 字节，类型 {:?}", size, content_type);

        Ok(MediaBody { size, content_type })
    }
}

/// 尝试从错误响应体中读出服务端提供的提示
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
}

/// 把状态码归类，用于日志和终端提示
pub fn describe_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "请求无效",
        StatusCode::NOT_FOUND => "接口不存在",
        StatusCode::TOO_MANY_REQUESTS => "请求过于频繁",
        s if s.is_server_error() => "服务器内部错误",
        _ => "请求失败",
    }
}
