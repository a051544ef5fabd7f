// src/config/file.rs

use crate::{
    config::ExternalConfig, // 只需要从父模块导入结构体定义
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) fn default_config_dir() -> AppResult<PathBuf> {
    let dir = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("无法获取用户主目录")))?
        .join(constants::CONFIG_DIR_NAME);
    Ok(dir)
}

pub(crate) fn default_config_path() -> AppResult<PathBuf> {
    Ok(default_config_dir()?.join(constants::CONFIG_FILE_NAME))
}

/// 读取配置文件；文件不存在时写入一份默认配置再返回
pub(crate) fn load_or_create_external_config(config_path: &Path) -> AppResult<ExternalConfig> {
    if config_path.is_file() {
        debug!("读取配置文件: {}", config_path.display());
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("读取配置文件 '{}' 失败", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("配置文件 {:?} 不存在，将创建默认配置。", config_path);
        let config = ExternalConfig::default();

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json_content = serde_json::to_string_pretty(&config)?;
        fs::write(config_path, json_content)
            .with_context(|| format!("写入默认配置 '{}' 失败", config_path.display()))?;

        Ok(config)
    }
}
