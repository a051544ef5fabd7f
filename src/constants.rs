// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const TITLE_TRUNCATE_LENGTH: usize = 60;
pub const MAX_FILENAME_CHARS: usize = 200;
/// 常见文件系统对单个文件名的字节数限制
pub const MAX_FILENAME_BYTES: usize = 255;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "app.log";
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const DEFAULT_SAVE_DIR: &str = "downloads";
pub const DEFAULT_VIDEO_QUALITY: &str = "best";
pub const FALLBACK_FILE_STEM: &str = "video";
pub const USER_AGENT: &str = concat!(clap::crate_name!(), "/", clap::crate_version!());

pub const ENV_API_BASE: &str = "STREAM_DL_API_BASE";
pub const ENV_ORIGIN: &str = "STREAM_DL_ORIGIN";

pub mod api {
    /// 本地开发时直接访问的后端地址
    pub const LOCAL_BACKEND_BASE: &str = "http://localhost:5000/api";
    /// 部署环境中由边缘服务器反向代理的相对路径
    pub const PROXIED_PATH: &str = "/api";
    /// 前端经 nginx 代理运行时使用的端口
    pub const PROXIED_DEV_PORT: u16 = 8080;
    pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

    pub mod endpoints {
        pub const VALIDATE: &str = "validate";
        pub const DOWNLOAD: &str = "download";
        pub const HEALTH: &str = "health";
        pub const INFO: &str = "info";
    }

    pub mod messages {
        pub const VALIDATE_FAILED: &str = "验证链接失败";
        pub const VALIDATE_UNKNOWN: &str = "未知错误";
        pub const DOWNLOAD_FAILED: &str = "下载失败";
    }
}

pub mod network {
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const TIMEOUT_SECS: u64 = 300;
    pub const MAX_RETRIES: u32 = 0;
}
