// src/config.rs

pub mod file;

use self::file::{default_config_path, load_or_create_external_config};
use crate::{
    cli::Cli,
    constants::{self, api},
    error::{AppError, AppResult},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub network: NetworkConfig,
    pub default_quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        // 为 NetworkConfig 提供一组默认值；重试默认关闭，失败只报告一次
        let network = NetworkConfig {
            connect_timeout_secs: Some(constants::network::CONNECT_TIMEOUT_SECS),
            timeout_secs: Some(constants::network::TIMEOUT_SECS),
            max_retries: Some(constants::network::MAX_RETRIES),
        };
        Self {
            api_base: None,
            origin: None,
            network,
            default_quality: constants::DEFAULT_VIDEO_QUALITY.to_string(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 以 `/` 结尾，方便直接 join 接口名
    pub api_base: Url,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub default_quality: String,
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let external_config = load_or_create_external_config(&config_path)?;
        debug!("配置文件内容: {:?}", external_config);

        // 命令行（含环境变量）优先于配置文件
        let api_base = resolve_api_base(
            args.api_base.as_deref().or(external_config.api_base.as_deref()),
            args.origin.as_deref().or(external_config.origin.as_deref()),
        )?;

        let network = &external_config.network;
        Ok(Self {
            api_base,
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                network
                    .connect_timeout_secs
                    .unwrap_or(constants::network::CONNECT_TIMEOUT_SECS),
            ),
            timeout: Duration::from_secs(
                args.timeout
                    .or(network.timeout_secs)
                    .unwrap_or(constants::network::TIMEOUT_SECS),
            ),
            max_retries: args
                .retries
                .or(network.max_retries)
                .unwrap_or(constants::network::MAX_RETRIES),
            default_quality: args
                .quality
                .clone()
                .unwrap_or(external_config.default_quality),
            output_dir: args
                .output
                .clone()
                .or(external_config.output_dir)
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_SAVE_DIR)),
        })
    }

    pub fn endpoint(&self, name: &str) -> AppResult<Url> {
        Ok(self.api_base.join(name)?)
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: normalize_base(Url::parse(api::LOCAL_BACKEND_BASE).unwrap()),
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 0,
            default_quality: constants::DEFAULT_VIDEO_QUALITY.to_string(),
            output_dir: PathBuf::from(constants::DEFAULT_SAVE_DIR),
        }
    }
}

#[cfg(feature = "testing")]
impl AppConfig {
    /// 让客户端指向给定的服务器（测试中通常是 mockito）
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = normalize_base(Url::parse(base).expect("测试用的 api_base 无效"));
        self
    }
}

/// 选择后端地址。
///
/// 显式配置的地址总是优先；否则由前端所在的 origin 决定：
/// 本地开发 origin（localhost 且不是代理端口）或没有 origin 时直连本地后端，
/// 其他情况使用 origin 下由边缘服务器代理的 `/api`。
pub fn resolve_api_base(explicit: Option<&str>, origin: Option<&str>) -> AppResult<Url> {
    if let Some(base) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        let url = Url::parse(base)
            .map_err(|e| AppError::Config(format!("api_base '{}' 无效: {}", base, e)))?;
        return Ok(normalize_base(url));
    }

    let origin = match origin.map(str::trim).filter(|s| !s.is_empty()) {
        Some(origin) => Url::parse(origin)
            .map_err(|e| AppError::Config(format!("origin '{}' 无效: {}", origin, e)))?,
        None => return Ok(normalize_base(Url::parse(api::LOCAL_BACKEND_BASE)?)),
    };

    if is_local_dev_origin(&origin) {
        debug!("origin {} 为本地开发环境，直连本地后端", origin);
        Ok(normalize_base(Url::parse(api::LOCAL_BACKEND_BASE)?))
    } else {
        Ok(normalize_base(origin.join(api::PROXIED_PATH)?))
    }
}

fn is_local_dev_origin(origin: &Url) -> bool {
    let is_local_host = origin
        .host_str()
        .is_some_and(|host| api::LOCAL_HOSTS.contains(&host));
    is_local_host && origin.port_or_known_default() != Some(api::PROXIED_DEV_PORT)
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    url
}
