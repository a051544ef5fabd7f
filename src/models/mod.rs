// src/models/mod.rs

pub mod api;

use crate::{constants, symbols, utils};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};
use tempfile::NamedTempFile;

/// 服务端提供的一个可选清晰度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl QualityOption {
    pub fn display_label(&self) -> String {
        match self.note.as_deref() {
            Some(note) if !note.is_empty() => format!("{} - {}", self.label, note),
            _ => self.label.clone(),
        }
    }
}

/// validate 接口解析出的视频信息，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPreview {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub duration_string: String,
    #[serde(default)]
    pub uploader: String,
    #[serde(default)]
    pub qualities: Vec<QualityOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

impl VideoPreview {
    /// 第一个选项即默认选项；列表为空时退回到 "best"
    pub fn default_quality(&self) -> &str {
        self.qualities
            .first()
            .map(|q| q.value.as_str())
            .unwrap_or(constants::DEFAULT_VIDEO_QUALITY)
    }

    pub fn find_quality(&self, value: &str) -> Option<&QualityOption> {
        self.qualities
            .iter()
            .find(|q| q.value.eq_ignore_ascii_case(value))
    }

    pub fn file_name(&self, download_type: DownloadType) -> String {
        utils::download_file_name(&self.title, download_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadType {
    #[default]
    Video,
    Audio,
}

impl DownloadType {
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadType::Video => ".mp4",
            DownloadType::Audio => ".mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DownloadType::Video => "video/mp4",
            DownloadType::Audio => "audio/mpeg",
        }
    }

    pub fn progress_message(&self) -> &'static str {
        match self {
            DownloadType::Video => "正在准备下载...",
            DownloadType::Audio => "正在下载音频...",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            DownloadType::Video => "视频下载成功！",
            DownloadType::Audio => "音频下载成功！",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadType::Video => write!(f, "video"),
            DownloadType::Audio => write!(f, "audio"),
        }
    }
}

/// download 接口的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: String,
    pub download_type: DownloadType,
}

/// 用户在预览之后做出的选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub quality: Option<String>,
    pub download_type: DownloadType,
}

/// 已完整写入临时文件的下载内容，尚未改名为最终文件
#[derive(Debug)]
pub struct DownloadedPayload {
    pub file: NamedTempFile,
    pub size: u64,
    pub content_type: Option<String>,
    pub file_name: String,
    pub download_type: DownloadType,
}

impl DownloadedPayload {
    /// 服务器声明的类型；没有声明时按下载类型推断
    pub fn media_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.download_type.mime_type())
    }
}

#[derive(Debug, Clone)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: u64,
    pub media_type: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DownloadAction {
    Skip,
    Overwrite,
    DownloadNew,
}

/// 界面状态，任意时刻只处于其中一种
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ApplicationState {
    #[default]
    Idle,
    Validating,
    PreviewReady {
        preview: VideoPreview,
        notice: Option<String>,
    },
    Downloading,
    Error(String),
}

impl ApplicationState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ApplicationState::Validating | ApplicationState::Downloading)
    }

    pub fn preview(&self) -> Option<&VideoPreview> {
        match self {
            ApplicationState::PreviewReady { preview, .. } => Some(preview),
            _ => None,
        }
    }

    pub fn get_display_info(
        &self,
    ) -> (
        &'static ColoredString,
        fn(ColoredString) -> ColoredString,
        &'static str,
    ) {
        match self {
            ApplicationState::Idle => (&symbols::INFO, |s| s.normal(), "等待输入链接"),
            ApplicationState::Validating => (&symbols::INFO, |s| s.cyan(), "正在解析链接"),
            ApplicationState::PreviewReady { .. } => (&symbols::OK, |s| s.green(), "视频信息已就绪"),
            ApplicationState::Downloading => (&symbols::INFO, |s| s.cyan(), "正在下载"),
            ApplicationState::Error(_) => (&symbols::ERROR, |s| s.red(), "操作失败"),
        }
    }
}
