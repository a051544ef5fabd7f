// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("请输入视频链接")]
    EmptyInput,
    #[error("链接格式无效，请确认这是一个 YouTube 视频链接")]
    InvalidUrlFormat,
    #[error("{message}")] // 服务端返回的信息原样展示
    Api { status: Option<u16>, message: String },
    #[error("网络请求失败: {0}")]
    NetworkFailure(#[from] reqwest::Error),
    #[error("网络中间件错误: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("尚未选择任何视频")]
    NoActiveSelection,
    #[error("已有请求正在进行，请稍候")]
    Busy,
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("临时文件持久化失败: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("配置错误: {0}")]
    Config(String),
    #[error("用户中断")]
    UserInterrupt,
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Api {
            status,
            message: message.into(),
        }
    }

    /// 请求未能完成（连接失败、超时等），区别于服务端明确返回的错误
    pub fn is_network_failure(&self) -> bool {
        match self {
            AppError::NetworkFailure(_) => true,
            AppError::NetworkMiddleware(_) => true,
            _ => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
