// src/models/api.rs

use super::VideoPreview;
use serde::Deserialize;
use std::collections::BTreeMap;

// --- validate 接口 ---

#[derive(Deserialize, Debug, Clone)]
pub struct ValidateResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<VideoPreview>,
    pub error: Option<String>,
}

// --- 通用错误体 ---

/// 后端在失败时返回的 JSON。路由级错误用 `error`，框架级错误（404/500）额外带 `message`。
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.filter(|s| !s.is_empty()).or(self.message.filter(|s| !s.is_empty()))
    }
}

// --- 辅助接口 ---

#[derive(Deserialize, Debug, Clone)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApiInfo {
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    pub version: Option<String>,
    pub documentation: Option<String>,
}
