// src/logging.rs

use crate::{cli::LogLevel, config::file::default_config_dir, constants};
use log::warn;
use std::{
    env,
    fs::File,
    path::{Path, PathBuf},
};

/// 日志只写入文件，终端输出统一走 `ui`
pub fn setup_logging(level: LogLevel) {
    if level == LogLevel::Off {
        return;
    }
    let filter: log::LevelFilter = level.into();

    // 使用 clap::crate_name!() 宏获取程序名，避免硬编码
    let app_name = clap::crate_name!();

    // 优先使用配置目录，无法获取主目录时回退到临时目录
    let log_file_path = match default_config_dir() {
        Ok(dir) => dir.join(constants::LOG_FILE_NAME),
        Err(_) => {
            eprintln!("警告: 无法获取用户主目录，日志将写入临时目录。");
            env::temp_dir().join(app_name).join(constants::LOG_FILE_NAME)
        }
    };

    if let Some(dir) = log_file_path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
    }

    let fallback_path: PathBuf = env::temp_dir().join(format!(
        "{}-{}",
        app_name,
        constants::LOG_FALLBACK_FILE_NAME
    ));
    let Some((file_appender, fallback_used)) = open_log_file(&log_file_path, &fallback_path) else {
        return;
    };

    let result = fern::Dispatch::new()
        .level(filter)
        // 依赖库的日志太多，只保留警告以上
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("rustls", log::LevelFilter::Warn)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file_appender)
        .apply();

    match result {
        // 日志系统就绪后才能记录这条信息
        Ok(()) => {
            if let Some(path) = fallback_used {
                warn!("日志将写入备用文件: {:?}", path);
            }
        }
        Err(e) => eprintln!("警告: 日志系统初始化失败: {}", e),
    }
}

/// 打开主日志文件，失败时改用备用文件。第二个返回值是实际使用的备用路径。
fn open_log_file(primary: &Path, fallback: &Path) -> Option<(File, Option<PathBuf>)> {
    match fern::log_file(primary) {
        Ok(file) => Some((file, None)),
        Err(e) => {
            eprintln!(
                "警告: 无法打开主日志文件 {:?} : {}。将尝试使用备用日志文件。",
                primary, e
            );
            match fern::log_file(fallback) {
                Ok(file) => Some((file, Some(fallback.to_path_buf()))),
                Err(e_fb) => {
                    eprintln!(
                        "错误: 无法创建主日志和备用日志文件 {:?}: {}。日志将不会被记录到文件。",
                        fallback, e_fb
                    );
                    None
                }
            }
        }
    }
}
