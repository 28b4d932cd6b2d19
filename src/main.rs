// src/main.rs

use clap::Parser;
use colored::*;
use log::{error, info};
use skl_dl::{RunContext, cli::Cli, logging, run_from_cli, symbols};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::setup(cli.log_level);
    info!("{} v{} 启动", clap::crate_name!(), clap::crate_version!());

    let run_ctx = Arc::new(RunContext::new());

    // Ctrl-C: 先让索引页落到与磁盘一致的状态，再以 130 退出
    let shutdown_ctx = run_ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!(
                "\n{} 收到中断信号 ({}), 正在收尾...",
                *symbols::WARN,
                *symbols::CTRL_C
            );
            shutdown_ctx.shutdown();
            std::process::exit(130);
        }
    });

    if let Err(e) = run_from_cli(cli, run_ctx).await {
        error!("运行以错误结束: {}", e);
        eprintln!("\n{} {}", *symbols::ERROR, e.to_string().red());
        std::process::exit(1);
    }
}
