// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod storage;
pub mod symbols;
pub mod ui;
pub mod utils;

use crate::{
    cli::Cli,
    client::ApiClient,
    config::AppConfig,
    error::{AppError, AppResult},
    models::{DownloadAction, DownloadOptions, DownloadType, VideoPreview},
    session::DownloadSession,
};
use anyhow::anyhow;
use colored::*;
use log::{debug, error, info, warn};
use std::{io, path::Path, sync::Arc};

/// 执行上下文，包含所有任务所需的配置和工具
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<ApiClient>,
    pub args: Arc<Cli>,
}

impl AppContext {
    pub fn new(config: Arc<AppConfig>, args: Arc<Cli>) -> AppResult<Self> {
        let http_client = Arc::new(ApiClient::new(config.clone())?);
        Ok(Self {
            config,
            http_client,
            args,
        })
    }

    pub fn new_session(&self) -> DownloadSession {
        DownloadSession::new(self.http_client.clone())
    }
}

/// 单个任务的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Saved(std::path::PathBuf),
    Skipped(std::path::PathBuf),
    PreviewOnly,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);
    info!("API 地址: {}", config.api_base);

    let context = AppContext::new(config.clone(), args.clone())?;

    if args.health {
        return check_health(&context).await;
    }
    if args.api_info {
        return show_api_info(&context).await;
    }

    println!("{} API 地址: {}", *symbols::INFO, config.api_base);
    if args.interactive {
        handle_interactive_mode(context).await?;
    } else if let Some(batch_file) = &args.batch_file {
        process_batch_tasks(batch_file, context).await?;
    } else if let Some(url) = &args.url {
        let session = context.new_session();
        process_single_url(url, &context, &session, !args.yes).await?;
    }

    Ok(())
}

async fn check_health(context: &AppContext) -> AppResult<()> {
    let status = context.http_client.health().await?;
    let service = status.service.as_deref().unwrap_or("unknown");
    if status.is_healthy() {
        println!("{} 后端在线: {} ({})", *symbols::OK, service, context.config.api_base);
        Ok(())
    } else {
        warn!("后端状态异常: {:?}", status);
        Err(AppError::api(None, format!("后端状态异常: {}", status.status)))
    }
}

async fn show_api_info(context: &AppContext) -> AppResult<()> {
    let info = context.http_client.info().await?;
    let lines: Vec<String> = info
        .endpoints
        .iter()
        .map(|(path, desc)| format!("{:<16} {}", path, desc))
        .collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    let title = format!(
        "API 版本 {}",
        info.version.as_deref().unwrap_or("未知")
    );
    ui::box_message(&title, &lines, |s| s.cyan());
    if let Some(doc) = &info.documentation {
        println!("{} 文档: {}", *symbols::LINK, doc);
    }
    Ok(())
}

/// 解析链接、选择清晰度、下载并保存。`allow_prompt` 为 false 时不会向用户提问。
pub async fn process_single_url(
    url: &str,
    context: &AppContext,
    session: &DownloadSession,
    allow_prompt: bool,
) -> AppResult<TaskOutcome> {
    let spinner = ui::new_spinner("正在解析链接...");
    let result = session.on_validate_requested(url).await;
    spinner.finish_and_clear();
    let preview = result?;

    ui::render_preview(&preview);
    if context.args.preview_only {
        print_quality_list(&preview);
        return Ok(TaskOutcome::PreviewOnly);
    }

    let download_type = if allow_prompt && context.args.interactive {
        choose_download_type(context.args.download_type())
    } else {
        context.args.download_type()
    };
    let quality = choose_quality(&preview, download_type, context, allow_prompt);
    debug!("选择: 类型 {}, 清晰度 {:?}", download_type, quality);

    let target = storage::target_path(&context.config.output_dir, &preview.file_name(download_type));
    let overwrite = context.args.force
        || (allow_prompt
            && context.args.interactive
            && target.exists()
            && ui::confirm(&format!("文件 '{}' 已存在，是否覆盖?", target.display()), false));
    if storage::prepare_save_action(&target, overwrite) == DownloadAction::Skip {
        info!("文件已存在，跳过: {}", target.display());
        ui::info(&format!("文件已存在，跳过: {} (使用 --force 重新下载)", target.display()));
        return Ok(TaskOutcome::Skipped(target));
    }

    let options = DownloadOptions {
        quality,
        download_type,
    };
    let pbar = ui::new_download_progress_bar(download_type);
    let result = session
        .on_download_requested(&options, &context.config.output_dir, &pbar)
        .await;
    pbar.finish_and_clear();
    let payload = result?;

    let saved = storage::save_payload(&context.config.output_dir, payload)?;
    ui::render_state(&session.state());
    println!(
        "{} 已保存到: {} ({}, {})",
        *symbols::LINK,
        saved.path.display(),
        indicatif::HumanBytes(saved.size),
        saved.media_type
    );
    Ok(TaskOutcome::Saved(saved.path))
}

fn print_quality_list(preview: &VideoPreview) {
    if preview.qualities.is_empty() {
        return;
    }
    println!("{} 可用清晰度:", *symbols::INFO);
    for quality in &preview.qualities {
        println!("  - {} [{}]", quality.display_label(), quality.value.yellow());
    }
}

fn choose_download_type(default: DownloadType) -> DownloadType {
    let options = vec!["视频 (MP4)".to_string(), "音频 (MP3)".to_string()];
    let default_index = if default == DownloadType::Audio { 1 } else { 0 };
    match ui::selection_menu(&options, "请选择下载类型", default_index) {
        Some(1) => DownloadType::Audio,
        Some(_) => DownloadType::Video,
        None => default,
    }
}

/// 音频不需要清晰度；命令行指定的值优先，其次询问用户，最后使用默认选项
fn choose_quality(
    preview: &VideoPreview,
    download_type: DownloadType,
    context: &AppContext,
    allow_prompt: bool,
) -> Option<String> {
    if download_type == DownloadType::Audio {
        return None;
    }
    if let Some(requested) = &context.args.quality {
        if !preview.qualities.is_empty() && preview.find_quality(requested).is_none() {
            warn!("清晰度 '{}' 不在服务端提供的列表中", requested);
            ui::warn(&format!("清晰度 '{}' 不在可选列表中，仍将交由服务器处理。", requested));
        }
        return Some(requested.clone());
    }
    if allow_prompt && preview.qualities.len() > 1 {
        let labels: Vec<String> = preview.qualities.iter().map(|q| q.display_label()).collect();
        if let Some(idx) = ui::selection_menu(&labels, "请选择视频清晰度", 0) {
            return Some(preview.qualities[idx].value.clone());
        }
    }
    // 配置文件中的偏好只有在服务端提供该选项时才生效
    let preferred = &context.config.default_quality;
    match preview.find_quality(preferred) {
        Some(option) => Some(option.value.clone()),
        None if preview.qualities.is_empty() => Some(preferred.clone()),
        None => Some(preview.default_quality().to_string()),
    }
}

async fn handle_interactive_mode(context: AppContext) -> AppResult<()> {
    ui::print_header("交互模式");
    println!("在此模式下，你可以逐一输入视频链接进行下载。直接按回车退出，按 {} 可随时中断。", *symbols::CTRL_C);

    let session = context.new_session();
    loop {
        match ui::prompt("请输入视频链接", None) {
            Ok(input) if !input.is_empty() => {
                session.dismiss_messages();
                match process_single_url(&input, &context, &session, !context.args.yes).await {
                    Ok(_) => {}
                    Err(e) => {
                        error!("交互模式任务 '{}' 失败: {}", input, e);
                        ui::render_error(&e);
                    }
                }
                session.reset()?;
            }
            Ok(_) => break, // 用户输入空行
            // 输入流结束（如管道输入已读完）与空行相同
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(_) => return Err(AppError::UserInterrupt),
        }
    }

    println!("\n{} 退出交互模式。", *symbols::INFO);
    Ok(())
}

async fn process_batch_tasks(batch_file: &Path, context: AppContext) -> AppResult<()> {
    let content = std::fs::read_to_string(batch_file).map_err(|e| {
        error!("读取批量文件 '{}' 失败: {}", batch_file.display(), e);
        AppError::from(e)
    })?;

    let tasks: Vec<String> = content
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect();
    if tasks.is_empty() {
        warn!("批量文件 '{}' 为空或不含有效行。", batch_file.display());
        ui::warn(&format!("批量文件 '{}' 为空。", batch_file.display()));
        return Ok(());
    }

    let session = context.new_session();
    let mut success = 0;
    let mut skipped = 0;
    let mut failed = 0;
    ui::print_header(&format!("开始批量处理任务 (按 {} 可随时退出)", *symbols::CTRL_C));
    for (i, task) in tasks.iter().enumerate() {
        ui::print_sub_header(&format!(
            "批量任务 {}/{} - {}",
            i + 1,
            tasks.len(),
            utils::truncate_text(task, constants::TITLE_TRUNCATE_LENGTH)
        ));
        if !utils::validate_url(task) {
            warn!("跳过无效条目: {}", task);
            ui::warn(&format!("跳过无效条目: {}", task));
            skipped += 1;
            continue;
        }
        match process_single_url(task, &context, &session, false).await {
            Ok(TaskOutcome::Skipped(_)) => skipped += 1,
            Ok(_) => success += 1,
            Err(e) => {
                failed += 1;
                error!("批量任务 '{}' 失败: {}", task, e);
                ui::render_error(&e);
            }
        }
        session.reset()?;
    }

    ui::print_header("批量任务报告");
    println!(
        "{} | {} | {} | 总计: {}",
        format!("成功任务: {}", success).green(),
        format!("失败任务: {}", failed).red(),
        format!("跳过任务: {}", skipped).yellow(),
        tasks.len()
    );
    if failed > 0 {
        Err(AppError::Other(anyhow!("{} 个批量任务执行失败。", failed)))
    } else {
        ui::success("所有批量任务已完成。");
        Ok(())
    }
}
