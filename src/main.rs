// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use stream_dl::{cli::Cli, logging, run_from_cli};
use std::{env, sync::Arc, time::Duration};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{} 用户强制中断程序。", "[!]".yellow());
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::process::exit(130);
        }
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "stream-dl".to_string());

    let after_help = format!(
        "示例:\n  # 启动交互模式 (推荐)\n  {bin} -i\n\n  # 下载单个视频的 720p 版本\n  {bin} --url \"https://youtu.be/dQw4w9WgXcQ\" -q 720p\n\n  # 只下载音频\n  {bin} --url \"https://youtu.be/dQw4w9WgXcQ\" --audio\n\n  # 批量下载\n  {bin} -b my_links.txt -o ./videos\n\n  # 检查后端是否在线\n  {bin} --health --api-base http://localhost:5000/api",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };

    logging::setup_logging(args.log_level);

    if let Err(e) = run_from_cli(args).await {
        log::error!("程序执行出错: {}", e);
        eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
        std::process::exit(1);
    }
}
