// src/cli.rs

use crate::{constants, models::DownloadType};
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["interactive", "url", "batch_file", "health", "api_info"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 启动交互式会话，逐一输入链接
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub interactive: bool,
    /// 解析并下载单个视频链接
    #[arg(long, help_heading = "Mode")]
    pub url: Option<String>,
    /// 从文本文件批量下载多个链接 (每行一个)
    #[arg(short, long, value_name = "FILE", help_heading = "Mode")]
    pub batch_file: Option<PathBuf>,
    /// 检查后端服务是否在线
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub health: bool,
    /// 显示后端 API 信息
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub api_info: bool,

    // --- 下载选项 (Options) ---
    /// 只下载音频 (MP3)，默认下载视频 (MP4)
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub audio: bool,
    /// 选择视频清晰度，例如 'best'、'720p'
    #[arg(short, long, help_heading = "Options")]
    pub quality: Option<String>,
    /// 只显示视频信息，不下载
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub preview_only: bool,
    /// 不询问，直接使用默认清晰度
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub yes: bool,
    /// 强制重新下载已存在的文件
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub force: bool,
    /// 设置文件保存目录
    #[arg(short, long, value_name = "DIR", help_heading = "Options")]
    pub output: Option<PathBuf>,

    // --- 连接选项 (Connection) ---
    /// 后端 API 地址，例如 'http://localhost:5000/api'
    #[arg(long, value_name = "URL", env = constants::ENV_API_BASE, help_heading = "Connection")]
    pub api_base: Option<String>,
    /// 前端部署地址，未指定 API 地址时据此选择后端
    #[arg(long, value_name = "URL", env = constants::ENV_ORIGIN, help_heading = "Connection")]
    pub origin: Option<String>,
    /// 单次请求的超时时间 (秒)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..), help_heading = "Connection")]
    pub timeout: Option<u64>,
    /// 网络瞬时故障时的重试次数 (默认不重试)
    #[arg(long, value_name = "N", help_heading = "Connection")]
    pub retries: Option<u32>,
    /// 使用指定的配置文件
    #[arg(long, value_name = "FILE", help_heading = "Connection")]
    pub config: Option<PathBuf>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

impl Cli {
    pub fn download_type(&self) -> DownloadType {
        if self.audio { DownloadType::Audio } else { DownloadType::Video }
    }
}
