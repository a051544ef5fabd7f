// src/ui.rs

use crate::{
    client,
    constants,
    error::AppError,
    models::{ApplicationState, DownloadType, VideoPreview},
    symbols, utils,
};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use std::{
    io::{self, Write},
    time::Duration,
};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn box_message(title: &str, content: &[&str], color_func: fn(ColoredString) -> ColoredString) {
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", color_func(title.bold()));
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));
    for line in content {
        println!("  {}", line);
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn warn(message: &str) {
    println!("{} {}", *symbols::WARN, message.yellow());
}

pub fn success(message: &str) {
    println!("{} {}", *symbols::OK, message.green());
}

pub fn error(message: &str) {
    eprintln!("{} {}", *symbols::ERROR, message.red());
}

/// 终端上展示一次失败。服务端给出的状态码会附带简短说明。
pub fn render_error(err: &AppError) {
    match err {
        AppError::Api {
            status: Some(code),
            message,
        } => {
            let reason = StatusCode::from_u16(*code)
                .map(client::describe_status)
                .unwrap_or("请求失败");
            error(&format!("{} ({} {})", message, code, reason));
        }
        e if e.is_network_failure() => {
            error(&format!("无法连接到服务器，请检查网络或后端是否已启动。({})", e));
        }
        e => error(&e.to_string()),
    }
}

pub fn render_preview(preview: &VideoPreview) {
    let title = utils::truncate_text(&preview.title, constants::TITLE_TRUNCATE_LENGTH);
    let mut lines = vec![
        format!("时长: {}", preview.duration_string),
        format!("作者: {}", preview.uploader),
    ];
    if let Some(id) = preview
        .video_id
        .clone()
        .or_else(|| utils::extract_video_id(&preview.url))
    {
        lines.push(format!("ID: {}", id));
    }
    if let Some(count) = preview.view_count {
        lines.push(format!("播放: {}", count));
    }
    if !preview.thumbnail.is_empty() {
        lines.push(format!("封面: {}", preview.thumbnail));
    }
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    box_message(&title, &lines, |s| s.cyan());
}

/// 根据状态快照输出提示信息
pub fn render_state(state: &ApplicationState) {
    let (symbol, color_fn, default_msg) = state.get_display_info();
    match state {
        ApplicationState::Error(message) => {
            eprintln!("{} {}", symbol, color_fn(message.as_str().into()));
        }
        ApplicationState::PreviewReady {
            notice: Some(notice),
            ..
        } => {
            println!("{} {}", symbol, color_fn(notice.as_str().into()));
        }
        _ => println!("{} {}", symbol, color_fn(default_msg.into())),
    }
}

pub fn prompt(message: &str, default: Option<&str>) -> io::Result<String> {
    let default_str = default.map_or("".to_string(), |d| format!(" (默认: {})", d));
    print!("\n>>> {}{}: ", message, default_str);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "输入已结束"));
    }
    let input = input.trim().to_string();
    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input)
    }
}

pub fn confirm(question: &str, default_yes: bool) -> bool {
    let options = if default_yes { "(Y/n)" } else { "(y/N)" };
    loop {
        match prompt(
            &format!("{} {} (按 {} 取消)", question, options, *symbols::CTRL_C),
            None,
        ) {
            Ok(choice) => {
                let choice = choice.to_lowercase();
                if choice == "y" {
                    return true;
                }
                if choice == "n" {
                    return false;
                }
                if choice.is_empty() {
                    return default_yes;
                }
                println!("{}", "无效输入，请输入 'y' 或 'n'。".red());
            }
            Err(_) => return false,
        }
    }
}

/// 显示编号菜单，返回用户选中的下标（从 0 开始）；直接回车选择默认项
pub fn selection_menu(options: &[String], title: &str, default_index: usize) -> Option<usize> {
    if options.is_empty() {
        return None;
    }
    println!("\n┌{}┐", "─".repeat(constants::UI_WIDTH - 2));
    println!("  {}", title.cyan().bold());
    println!("├{}┤", "─".repeat(constants::UI_WIDTH - 2));

    let pad = options.len().to_string().len();
    for (i, option) in options.iter().enumerate() {
        println!(
            "  [{}] {}",
            format!("{:<pad$}", i + 1, pad = pad).yellow(),
            option
        );
    }
    println!("└{}┘", "─".repeat(constants::UI_WIDTH - 2));

    let default_choice = (default_index + 1).to_string();
    loop {
        let input = prompt("请输入数字选择", Some(&default_choice)).ok()?;
        match input.parse::<usize>() {
            Ok(idx) if idx > 0 && idx <= options.len() => return Some(idx - 1),
            _ => println!("{} 无效的选择 '{}'。", *symbols::ERROR, input),
        }
    }
}

pub fn new_spinner(message: &str) -> ProgressBar {
    let pbar = ProgressBar::new_spinner();
    pbar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pbar.set_message(message.to_string());
    pbar.enable_steady_tick(Duration::from_millis(100));
    pbar
}

/// 下载进度条；服务器给出长度后切换为字节进度
pub fn new_download_progress_bar(download_type: DownloadType) -> ProgressBar {
    let pbar = ProgressBar::no_length();
    pbar.set_style(
        ProgressStyle::with_template(
            "{prefix:.bold.cyan} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    pbar.set_prefix(match download_type {
        DownloadType::Video => "视频",
        DownloadType::Audio => "音频",
    });
    pbar.set_message(download_type.progress_message());
    pbar.enable_steady_tick(Duration::from_millis(100));
    pbar
}
